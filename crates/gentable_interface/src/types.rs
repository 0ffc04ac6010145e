//! Shared types for the provider/storage/sandbox trait seams.

use serde::{Deserialize, Serialize};

/// Why generation stopped (provider-level classification; the engine also
/// writes the raw string into a cell's `finish_reason`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::EnumIter,
)]
pub enum FinishReason {
    /// Model completed naturally.
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Hit a stop sequence.
    StopSequence,
    /// Model requested tool/function call.
    ToolUse,
    /// Content was filtered.
    ContentFilter,
    /// The cell failed (context overflow, exhausted retries, sandbox error).
    Error,
    /// Other/unknown reason.
    Other,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::StopSequence => "stop_sequence",
            FinishReason::ToolUse => "tool_use",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Error => "error",
            FinishReason::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Definition of a tool/function that the model can call (spec §3 `LLM.tools?`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool/function.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema defining the parameters this tool accepts.
    pub parameters: serde_json::Value,
}

/// Result of a tool execution to send back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID matching the tool call this is responding to.
    pub id: String,
    /// The output from executing the tool (as JSON).
    pub output: serde_json::Value,
    /// Whether the tool execution resulted in an error.
    pub is_error: bool,
}

/// Information about a provider's model capabilities and limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
    /// Provider name (e.g., "anthropic", "openai", "gemini").
    pub provider: &'static str,
    /// Model identifier.
    pub model: String,
    /// Maximum input context tokens.
    pub max_input_tokens: usize,
    /// Maximum output tokens per request.
    pub max_output_tokens: usize,
    /// Supports streaming responses.
    pub supports_streaming: bool,
    /// Supports function/tool calling.
    pub supports_tool_use: bool,
    /// Supports structured JSON output mode.
    pub supports_json_mode: bool,
}

/// Health status of a provider, storage, or sandbox backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational but with reduced performance.
    Degraded {
        /// Description of the degradation.
        message: String,
    },
    /// Not operational.
    Unhealthy {
        /// Description of the problem.
        message: String,
    },
}

/// A page of rows returned by `StorageEngine::list_rows` (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPage {
    /// The rows in this page.
    pub rows: Vec<gentable_core::Row>,
    /// Total matching rows across all pages, if known.
    pub total: Option<u64>,
}

/// Ordering direction for `StorageEngine::list_rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order.
    Ascending,
    /// Descending order.
    Descending,
}

/// A single order-by clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column to sort on.
    pub column: String,
    /// Sort direction.
    pub direction: SortDirection,
}
