//! Execution core for generative tables.
//!
//! This crate orchestrates the column-graph analysis, batch planning,
//! generator dispatch, retrieval-augmented generation, and row/request
//! level execution that turn a `RowAdd`/`RowRegen` request into a stream
//! of completed cells. Every provider, storage, and sandbox dependency is
//! reached only through the traits in `gentable_interface`; this crate
//! contains no vendor-specific code.
//!
//! # Example
//!
//! ```rust,ignore
//! use gentable_engine::{ColumnGraph, plan_batch};
//!
//! let graph = ColumnGraph::build(&schema)?;
//! let plan = plan_batch(&graph, table.cell_budget(), concurrent, multi_turn, to_generate);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dispatch;
mod graph;
mod multi_row_executor;
mod planner;
mod rag;
mod row_executor;

pub use dispatch::{CellChunk, DispatchContext};
pub use graph::ColumnGraph;
pub use multi_row_executor::{CommitMode, ExecutionOutcome, MultiRowExecutor};
pub use planner::{
    BatchPlan, RegenSelection, columns_needing_generation_for_add,
    columns_needing_generation_for_regen, plan_batch,
};
pub use rag::{RagContext, run_rag};
pub use row_executor::{RowChunk, RowExecutor, RowOutcome};
