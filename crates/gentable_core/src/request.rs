//! Row-write request and SSE event shapes (spec §6).

use crate::{References, Row, UsageEvent, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum rows permitted in a single add/regen request (spec §6, property 11).
pub const MAX_ROWS_PER_REQUEST: usize = 100;

/// `{table_id, data: [row, …], stream, concurrent}` — spec §6 "Add rows".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRowsRequest {
    /// The target table.
    pub table_id: String,
    /// Input rows, each a mapping from input-column id to value.
    pub data: Vec<HashMap<String, Value>>,
    /// Whether to stream SSE events rather than a single terminal response.
    pub stream: bool,
    /// Whether independent columns/rows may be dispatched concurrently.
    pub concurrent: bool,
}

/// How a regen request selects which output columns to regenerate (spec §4.B rule 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenStrategy {
    /// Regenerate every output column.
    RunAll,
    /// Regenerate only `output_column_id`.
    RunSelected,
    /// Regenerate every output column up to and including `output_column_id`.
    RunBefore,
    /// Regenerate every output column from `output_column_id` onward.
    RunAfter,
}

/// `{table_id, row_ids, regen_strategy, output_column_id?, stream, concurrent}`
/// — spec §6 "Regen rows".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenRowsRequest {
    /// The target table.
    pub table_id: String,
    /// The rows to regenerate.
    pub row_ids: Vec<String>,
    /// The regen strategy.
    pub regen_strategy: RegenStrategy,
    /// Required for `RunSelected`/`RunBefore`/`RunAfter`, ignored for `RunAll`.
    pub output_column_id: Option<String>,
    /// Whether to stream SSE events.
    pub stream: bool,
    /// Whether independent columns/rows may be dispatched concurrently.
    pub concurrent: bool,
}

/// A predicate for `WHERE row_ids OR predicate` deletes (spec §6 "Delete row(s)").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WherePredicate {
    /// Column to filter on.
    pub column: String,
    /// Comparison operator, e.g. `"="`, `"<"`, `"contains"`.
    pub op: String,
    /// Comparison value.
    pub value: serde_json::Value,
}

/// `{row_ids?, where: [predicate, …]}` combined with `AND` — spec §6 "Delete row(s)".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeleteRowsRequest {
    /// Explicit row ids to delete.
    pub row_ids: Option<Vec<String>>,
    /// Predicates ANDed together.
    #[serde(default)]
    pub r#where: Vec<WherePredicate>,
}

/// Non-generating partial row update — spec §6 "Update row(s)".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRowsRequest {
    /// The target table.
    pub table_id: String,
    /// Row id to partial-value mapping.
    pub updates: HashMap<String, HashMap<String, Value>>,
}

/// `gen_table.completion.chunk` — one streamed delta from a single (row, column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellCompletionChunk {
    /// Always `"gen_table.completion.chunk"`.
    pub object: &'static str,
    /// The output column this chunk belongs to.
    pub output_column_name: String,
    /// The row this chunk belongs to.
    pub row_id: String,
    /// The incremental text delta, if any.
    pub text_delta: Option<String>,
    /// Set on the terminal chunk for this column.
    pub finish_reason: Option<String>,
    /// Usage totals, set on the terminal chunk.
    pub usage: Option<UsageEvent>,
    /// Retrieved citations, set on a leading chunk when RAG ran.
    pub references: Option<References>,
}

impl CellCompletionChunk {
    /// Construct a text delta chunk.
    pub fn text_delta(output_column_name: String, row_id: String, delta: String) -> Self {
        Self {
            object: "gen_table.completion.chunk",
            output_column_name,
            row_id,
            text_delta: Some(delta),
            finish_reason: None,
            usage: None,
            references: None,
        }
    }

    /// Construct a terminal chunk carrying the finish reason and usage totals.
    pub fn terminal(
        output_column_name: String,
        row_id: String,
        finish_reason: String,
        usage: Option<UsageEvent>,
    ) -> Self {
        Self {
            object: "gen_table.completion.chunk",
            output_column_name,
            row_id,
            text_delta: None,
            finish_reason: Some(finish_reason),
            usage,
            references: None,
        }
    }
}

/// `gen_table.completion.chunks` — per-row completion summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowCompletionResponse {
    /// Always `"gen_table.completion.chunks"`.
    pub object: &'static str,
    /// The completed row.
    pub row_id: String,
    /// Final value per output column.
    pub columns: HashMap<String, Value>,
}

impl RowCompletionResponse {
    /// Build a completion summary from a closed row.
    pub fn from_row(row: &Row) -> Self {
        Self {
            object: "gen_table.completion.chunks",
            row_id: row.id().to_string(),
            columns: row.values().clone(),
        }
    }
}

/// `gen_table.references` — leading citation chunk for an LLM column with RAG enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenTableReferencesEvent {
    /// Always `"gen_table.references"`.
    pub object: &'static str,
    /// The output column these references feed.
    pub output_column_name: String,
    /// The row these references feed.
    pub row_id: String,
    /// Retained chunks.
    pub chunks: Vec<crate::ReferenceChunk>,
}

/// The complete vocabulary of SSE events a row-write request may emit
/// (spec §6). The terminal `[DONE]` marker is not modeled here — callers
/// write the literal `data: [DONE]\n\n` after the last event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "object")]
pub enum SseEvent {
    /// `gen_table.completion.chunk`.
    #[serde(rename = "gen_table.completion.chunk")]
    CompletionChunk(CellCompletionChunk),
    /// `gen_table.completion.chunks`.
    #[serde(rename = "gen_table.completion.chunks")]
    RowCompletion(RowCompletionResponse),
    /// `gen_table.references`.
    #[serde(rename = "gen_table.references")]
    References(GenTableReferencesEvent),
}
