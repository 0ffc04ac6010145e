//! Errors from the sandboxed Python code generator (spec §4.C `PythonGen`).

/// Kinds of sandbox failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SandboxErrorKind {
    /// The snippet exceeded its wall-clock budget.
    #[display("Execution exceeded the {}ms wall-clock budget", budget_ms)]
    Timeout {
        /// Configured budget in milliseconds.
        budget_ms: u64,
    },
    /// The snippet exceeded its memory budget.
    #[display("Execution exceeded the {}MiB memory budget", budget_mib)]
    MemoryExceeded {
        /// Configured budget in MiB.
        budget_mib: u64,
    },
    /// The snippet raised an exception or exited non-zero.
    #[display("Execution failed: {}", _0)]
    ExecutionFailed(String),
    /// The snippet was rejected before execution (disallowed import, syntax error).
    #[display("Snippet rejected: {}", _0)]
    Denied(String),
    /// The sandbox's output could not be interpreted as a scalar value.
    #[display("Malformed output: {}", _0)]
    MalformedOutput(String),
}

/// Sandbox error with location tracking.
///
/// # Examples
///
/// ```
/// use gentable_error::{SandboxError, SandboxErrorKind};
///
/// let err = SandboxError::new(SandboxErrorKind::Timeout { budget_ms: 120_000 });
/// assert!(format!("{}", err).contains("120000ms"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Sandbox Error: {} at line {} in {}", kind, line, file)]
pub struct SandboxError {
    /// The kind of error that occurred.
    pub kind: SandboxErrorKind,
    /// Line number where error was created.
    pub line: u32,
    /// File where error was created.
    pub file: &'static str,
}

impl SandboxError {
    /// Create a new sandbox error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SandboxErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
