//! Retrieved citation chunks attached to an LLM column's output (spec §4.D, §6).

use serde::{Deserialize, Serialize};

/// One retained chunk from a hybrid-search + rerank pass.
///
/// # Examples
///
/// ```
/// use gentable_core::ReferenceChunk;
/// use serde_json::json;
///
/// let chunk = ReferenceChunk {
///     text: "The capital of France is Paris.".to_string(),
///     title: Some("Geography 101".to_string()),
///     page: Some(4),
///     file_name: Some("geo101.pdf".to_string()),
///     metadata: json!({"source_row_id": "row_9"}),
/// };
/// assert!(chunk.text.contains("Paris"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceChunk {
    /// The retrieved passage text.
    pub text: String,
    /// Source document title, if known.
    pub title: Option<String>,
    /// Source page number, if known.
    pub page: Option<u32>,
    /// Source file name, if known.
    pub file_name: Option<String>,
    /// Free-form provenance (source table id, row id, column id, score).
    pub metadata: serde_json::Value,
}

/// The set of chunks retained after a RAG sub-step, prepended to an LLM
/// column's output stream as a leading chunk. An empty set is legal.
///
/// # Examples
///
/// ```
/// use gentable_core::References;
///
/// let empty = References::empty("kb_1".to_string());
/// assert!(empty.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct References {
    /// The knowledge table these chunks were retrieved from.
    pub source_table_id: String,
    /// The retained chunks, already reranked and thresholded.
    pub chunks: Vec<ReferenceChunk>,
}

impl References {
    /// An empty reference set (no retrieval results, or retrieval disabled).
    pub fn empty(source_table_id: String) -> Self {
        Self {
            source_table_id,
            chunks: Vec::new(),
        }
    }

    /// Whether no chunks were retained.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
