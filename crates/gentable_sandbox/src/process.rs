//! Out-of-process `PythonGen` executor (spec §4.C, §9 open question (a)).
//!
//! Each invocation spawns a fresh `python3` interpreter with no inherited
//! environment, a capped address space (`RLIMIT_AS`, Unix only), and a
//! wall-clock deadline enforced from the caller side with
//! [`tokio::time::timeout`] — the process is killed, not just abandoned,
//! if it overruns. [`crate::policy::validate`] runs first so a snippet
//! that obviously reaches for the filesystem or network never gets as
//! far as a process spawn.

use crate::convert::{plain_json_to_scalar_value, row_to_plain_json};
use crate::policy;
use async_trait::async_trait;
use base64::Engine as _;
use gentable_core::Value;
use gentable_error::{GentableResult, SandboxError, SandboxErrorKind};
use gentable_interface::{CodeSandbox, SandboxOutput};
use std::collections::HashMap;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Marker line the harness script prints ahead of its JSON-encoded result,
/// so stray `print()` calls in the snippet don't get mistaken for it.
const RESULT_MARKER: &str = "@@GENTABLE_RESULT@@";

/// Caps the harness enforces on one `PythonGen` invocation.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Path or name of the Python 3 interpreter to spawn.
    pub python_path: String,
    /// Wall-clock budget per invocation (spec §5: "code ~120s").
    pub time_budget: Duration,
    /// Address-space budget per invocation, in MiB.
    pub memory_budget_mib: u64,
    /// Captured stdout is truncated to this many bytes.
    pub stdout_cap_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python_path: "python3".to_string(),
            time_budget: Duration::from_secs(120),
            memory_budget_mib: 256,
            stdout_cap_bytes: 64 * 1024,
        }
    }
}

/// Subprocess-backed [`CodeSandbox`].
pub struct ProcessSandbox {
    config: SandboxConfig,
}

impl ProcessSandbox {
    /// Build a sandbox with the given caps.
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    fn harness_script(code: &str, row_b64: &str) -> String {
        format!(
            r#"import base64, json, sys

row = json.loads(base64.b64decode("{row_b64}").decode("utf-8"))

{code}

sys.stdout.write("{marker}" + json.dumps(result))
sys.stdout.write("\n")
"#,
            row_b64 = row_b64,
            code = code,
            marker = RESULT_MARKER,
        )
    }

    #[cfg(unix)]
    fn apply_memory_limit(cmd: &mut Command, memory_budget_mib: u64) {
        use std::os::unix::process::CommandExt;
        let bytes = memory_budget_mib.saturating_mul(1024 * 1024);
        // Safety: the closure only calls async-signal-safe libc functions
        // (`setrlimit`) between fork and exec, as `pre_exec` requires.
        unsafe {
            cmd.pre_exec(move || {
                let limit = libc::rlimit { rlim_cur: bytes as libc::rlim_t, rlim_max: bytes as libc::rlim_t };
                if libc::setrlimit(libc::RLIMIT_AS, &limit) != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    #[cfg(not(unix))]
    fn apply_memory_limit(_cmd: &mut Command, _memory_budget_mib: u64) {}
}

#[async_trait]
impl CodeSandbox for ProcessSandbox {
    async fn run(&self, code: &str, row: &HashMap<String, Value>) -> GentableResult<SandboxOutput> {
        policy::validate(code)?;

        let row_json = row_to_plain_json(row);
        let row_b64 = base64::engine::general_purpose::STANDARD.encode(row_json.to_string());
        let script = Self::harness_script(code, &row_b64);

        let mut cmd = Command::new(&self.config.python_path);
        cmd.arg("-I") // isolated mode: ignore PYTHON* env vars and user site packages
            .arg("-c")
            .arg(&script)
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Self::apply_memory_limit(&mut cmd, self.config.memory_budget_mib);

        let mut child = cmd.spawn().map_err(|err| {
            SandboxError::new(SandboxErrorKind::ExecutionFailed(format!(
                "failed to spawn {}: {err}",
                self.config.python_path
            )))
        })?;

        // `env_clear` + stdin(null) leave nothing for the child to read;
        // close its stdin handle explicitly so a snippet that calls
        // `input()` (already denylisted, but defense in depth) fails fast
        // rather than hanging until the timeout.
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.shutdown().await;
        }

        let started = Instant::now();
        let output = match tokio::time::timeout(self.config.time_budget, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Err(SandboxError::new(SandboxErrorKind::ExecutionFailed(format!(
                    "failed to collect sandbox output: {err}"
                )))
                .into());
            }
            Err(_) => {
                warn!(budget_ms = self.config.time_budget.as_millis() as u64, "PythonGen snippet timed out");
                return Err(SandboxError::new(SandboxErrorKind::Timeout {
                    budget_ms: self.config.time_budget.as_millis() as u64,
                })
                .into());
            }
        };
        let duration = started.elapsed();

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        stdout.truncate(self.config.stdout_cap_bytes);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_oom_exit(&output.status, &stderr) {
                return Err(SandboxError::new(SandboxErrorKind::MemoryExceeded {
                    budget_mib: self.config.memory_budget_mib,
                })
                .into());
            }
            return Err(SandboxError::new(SandboxErrorKind::ExecutionFailed(stderr.trim().to_string())).into());
        }

        let result_line = stdout
            .lines()
            .find(|line| line.starts_with(RESULT_MARKER))
            .ok_or_else(|| {
                SandboxError::new(SandboxErrorKind::MalformedOutput(
                    "snippet did not assign a `result` variable".to_string(),
                ))
            })?;
        let payload = &result_line[RESULT_MARKER.len()..];
        let parsed: serde_json::Value = serde_json::from_str(payload).map_err(|err| {
            SandboxError::new(SandboxErrorKind::MalformedOutput(format!("result was not valid JSON: {err}")))
        })?;
        let value = plain_json_to_scalar_value(parsed)?;

        debug!(duration_ms = duration.as_millis() as u64, "PythonGen snippet completed");
        Ok(SandboxOutput { result: value, stdout, duration })
    }

    fn time_budget(&self) -> Duration {
        self.config.time_budget
    }

    fn memory_budget_mib(&self) -> u64 {
        self.config.memory_budget_mib
    }
}

/// A process killed by `SIGKILL` (signal 9) with no other diagnostic is
/// the closest portable signal that the OOM killer, not the snippet
/// itself, ended the process — `setrlimit(RLIMIT_AS)` failures usually
/// surface as a Python `MemoryError` on stderr instead, which is not this
/// path but `ExecutionFailed`.
#[cfg(unix)]
fn is_oom_exit(status: &std::process::ExitStatus, stderr: &str) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(9) || stderr.contains("MemoryError")
}

#[cfg(not(unix))]
fn is_oom_exit(_status: &std::process::ExitStatus, stderr: &str) -> bool {
    stderr.contains("MemoryError")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harness_script_embeds_marker_and_row() {
        let script = ProcessSandbox::harness_script("result = row['a'] + 1", "eyJhIjogMX0=");
        assert!(script.contains(RESULT_MARKER));
        assert!(script.contains("eyJhIjogMX0="));
        assert!(script.contains("result = row['a'] + 1"));
    }

    #[test]
    fn default_config_matches_spec_budgets() {
        let config = SandboxConfig::default();
        assert_eq!(config.time_budget, Duration::from_secs(120));
        assert_eq!(config.memory_budget_mib, 256);
    }
}
