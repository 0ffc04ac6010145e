//! Retrieval-augmented generation parameters (spec §3, §4.D).

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Parameters controlling the retrieval sub-step run before an LLM column
/// with retrieval enabled.
///
/// # Examples
///
/// ```
/// use gentable_core::RagParams;
///
/// let rag = RagParams::new(
///     "knowledge_table_1".to_string(),
///     "rerank-english-v3.0".to_string(),
///     5,
///     "${user_question}".to_string(),
///     false,
///     Some(0.2),
/// );
/// assert_eq!(*rag.k(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct RagParams {
    /// The knowledge table to search against.
    table_id: String,
    /// Reranking model identifier.
    reranking_model: String,
    /// Number of chunks to retain after reranking.
    k: u32,
    /// Template rendered against the row draft to produce the search query.
    search_query_template: String,
    /// Whether reranker input concatenates all candidates into one call.
    concat_reranker_input: bool,
    /// Drop reranked chunks scoring below this threshold, if set.
    rerank_score_threshold: Option<f32>,
}

impl RagParams {
    /// Construct a new set of RAG parameters.
    pub fn new(
        table_id: String,
        reranking_model: String,
        k: u32,
        search_query_template: String,
        concat_reranker_input: bool,
        rerank_score_threshold: Option<f32>,
    ) -> Self {
        Self {
            table_id,
            reranking_model,
            k,
            search_query_template,
            concat_reranker_input,
            rerank_score_threshold,
        }
    }

    /// Candidate pool size pulled from the hybrid search before reranking
    /// (spec §4.D step 3: top-`5k`).
    pub fn candidate_pool_size(&self) -> u32 {
        self.k * 5
    }
}
