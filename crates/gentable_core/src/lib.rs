//! Core data types for the generative table execution engine.
//!
//! This crate defines the table/column/row data model, the generation-config
//! sum type, and the wire shapes shared by every other `gentable_*` crate —
//! without pulling in any provider client, storage engine, or scheduling
//! logic (those live in `gentable_interface`, `gentable_storage`, and
//! `gentable_engine` respectively).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod budget;
mod column;
mod dtype;
mod gen_config;
mod input;
mod llm_wire;
mod media;
mod message;
mod observability;
mod output;
mod progress;
mod rag;
mod references;
mod request;
mod role;
mod row;
mod table;
mod template;
mod usage;
mod value;

pub use budget::{CellBudget, DEFAULT_CELL_BUDGET};
pub use column::Column;
pub use dtype::DType;
pub use gen_config::{EmbedConfig, GenConfig, LlmConfig, PythonConfig};
pub use input::Input;
pub use llm_wire::{GenerateChunk, GenerateRequest, GenerateResponse};
pub use media::MediaSource;
pub use message::Message;
pub use observability::{
    ExporterBackend, ObservabilityConfig, init_observability, init_observability_with_config,
    shutdown_observability,
};
pub use output::{Output, ToolCall};
pub use progress::{ProgressRecord, ProgressState};
pub use rag::RagParams;
pub use references::{ReferenceChunk, References};
pub use request::{
    AddRowsRequest, CellCompletionChunk, DeleteRowsRequest, GenTableReferencesEvent,
    MAX_ROWS_PER_REQUEST, RegenRowsRequest, RegenStrategy, RowCompletionResponse, SseEvent,
    UpdateRowsRequest, WherePredicate,
};
pub use role::Role;
pub use row::{CellState, Row, RowStatus};
pub use table::{ID_COLUMN, Schema, TableKind, UPDATED_AT_COLUMN};
pub use template::{Segment, Template};
pub use usage::{UsageEvent, UsageKind};
pub use value::Value;
