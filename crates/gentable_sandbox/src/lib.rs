//! Sandboxed code execution for `PythonGen` output columns (spec §4.C, §9).
//!
//! [`ProcessSandbox`] is the concrete [`gentable_interface::CodeSandbox`]
//! the engine dispatches `PythonGen` cells through: each invocation spawns
//! a fresh, environment-scrubbed `python3` process with a capped address
//! space and a caller-enforced wall-clock deadline. A static denylist
//! (`policy`) rejects snippets that reach for the filesystem, network, or
//! process control before a process is ever spawned.
//!
//! Setting the child process's memory limit requires one `unsafe`
//! `pre_exec` block (see `process::ProcessSandbox::apply_memory_limit`);
//! everything else in this crate is safe code.

#![warn(missing_docs)]

mod convert;
mod policy;
mod process;

pub use process::{ProcessSandbox, SandboxConfig};
