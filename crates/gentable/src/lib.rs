//! Generative Table execution core.
//!
//! This crate ties together the workspace's component crates into a single
//! process: [`gentable_core`]'s data model, [`gentable_engine`]'s column-graph
//! analyzer, batch planner, generator dispatchers, and row/multi-row
//! executors, [`gentable_quota`]'s pre-flight checks and billing, and
//! [`gentable_server`]'s config loading and backend wiring. HTTP/RPC routing
//! is an explicit external collaborator (spec §1) and is not provided here;
//! the binary instead exposes a CLI for schema validation, batch-planner
//! inspection, and process bootstrap.

#![forbid(unsafe_code)]

pub use gentable_core::*;
pub use gentable_engine::{
    plan_batch, run_rag, BatchPlan, CellChunk, ColumnGraph, CommitMode, DispatchContext,
    ExecutionOutcome, MultiRowExecutor, RagContext, RegenSelection, RowChunk, RowExecutor,
    RowOutcome,
};
pub use gentable_error::*;
pub use gentable_interface::*;
pub use gentable_quota::*;
pub use gentable_server::{ServerConfig, ServerRuntime, UsageSink};
pub use gentable_storage::*;

#[cfg(feature = "database")]
pub use gentable_database::*;

pub mod cli;
