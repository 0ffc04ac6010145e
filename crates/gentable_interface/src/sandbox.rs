//! Abstract code-execution seam for `PythonGen` (spec §4.C), implemented
//! concretely by `gentable_sandbox`.

use async_trait::async_trait;
use gentable_core::Value;
use gentable_error::GentableResult;
use std::collections::HashMap;
use std::time::Duration;

/// Result of running a snippet in the sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxOutput {
    /// The value the snippet assigned to `result` (or returned).
    pub result: Value,
    /// Captured stdout, truncated to the sandbox's output cap.
    pub stdout: String,
    /// Wall-clock time the snippet actually ran for.
    pub duration: Duration,
}

/// Out-of-process code execution, with wall-clock and memory budgets
/// enforced by the implementation rather than the caller.
#[async_trait]
pub trait CodeSandbox: Send + Sync {
    /// Execute `code` with `row` bound as the input row's values (accessed
    /// in-snippet as `row['col']` / `row["col"]`), enforcing the sandbox's
    /// configured time and memory budgets.
    async fn run(
        &self,
        code: &str,
        row: &HashMap<String, Value>,
    ) -> GentableResult<SandboxOutput>;

    /// Wall-clock budget this sandbox enforces per invocation.
    fn time_budget(&self) -> Duration;

    /// Memory budget in MiB this sandbox enforces per invocation.
    fn memory_budget_mib(&self) -> u64;
}
