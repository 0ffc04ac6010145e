//! RAG sub-step (spec §4.D): retrieval run before an LLM column with
//! retrieval enabled.

use gentable_core::{RagParams, ReferenceChunk, References, Row, Template, UsageEvent, Value};
use gentable_error::GentableResult;
use gentable_interface::{Embedder, QuotaManager, Reranker, StorageEngine};
use std::sync::Arc;
use tracing::debug;

/// Everything one RAG sub-step invocation needs, assembled by the caller
/// from the knowledge table it targets and the request's shared backends.
///
/// `RagParams` names the knowledge table and the reranker but not an
/// embedding model — the query is embedded with whatever model embeds that
/// table's vector column (spec §4.D step 2), which the caller resolves
/// from the knowledge table's schema before constructing this context.
pub struct RagContext<'a> {
    /// The column's retrieval parameters.
    pub params: &'a RagParams,
    /// The embedding model identifier that embeds the knowledge table's
    /// vector column.
    pub embedding_model: &'a str,
    /// Embeds the search query.
    pub embedder: Arc<dyn Embedder>,
    /// Reranks the hybrid-search candidate pool.
    pub reranker: Arc<dyn Reranker>,
    /// Searches the knowledge table.
    pub storage: Arc<dyn StorageEngine>,
    /// Pre-flight checks and usage accounting for this request.
    pub quota: Arc<dyn QuotaManager>,
    /// Owning organization, stamped onto the rerank usage event.
    pub org_id: &'a str,
    /// Owning project, stamped onto the rerank usage event.
    pub project_id: &'a str,
    /// The column's already-resolved user prompt, used when
    /// `search_query_template` renders empty (spec §4.D step 1).
    pub fallback_query: &'a str,
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Run the RAG sub-step against `row`'s draft values, returning the
/// retained `References` (empty is legal, spec §4.D step 6).
pub async fn run_rag(ctx: &RagContext<'_>, row: &Row) -> GentableResult<References> {
    let source_table_id = ctx.params.table_id().clone();

    // Step 1: render the search query, falling back to the resolved prompt.
    let query_template = Template::compile(ctx.params.search_query_template());
    let rendered = query_template.render(|col| {
        row.get(col).map(Value::render_for_template).unwrap_or_default()
    });
    let query = if rendered.trim().is_empty() { ctx.fallback_query.to_string() } else { rendered };

    if query.trim().is_empty() {
        debug!(table = %source_table_id, "RAG query resolved empty; returning no references");
        return Ok(References::empty(source_table_id));
    }

    // Step 2: embed the query (embedding quota is a mandatory precheck on
    // every write-shaped endpoint, spec §6, even though the RAG sub-step
    // only bills `rerank` at its own step 5).
    let estimated_tokens = (query.len() / 4).max(1) as u64;
    ctx.quota.check_embed_quota(ctx.embedding_model, estimated_tokens).await?;
    let mut embeddings = ctx.embedder.embed(&[query.clone()]).await?;
    let query_embedding = match embeddings.pop() {
        Some(vector) => vector,
        None => return Ok(References::empty(source_table_id)),
    };

    // Step 3: hybrid search, top-5k candidate pool.
    let candidate_pool = ctx.params.candidate_pool_size() as usize;
    let candidates = ctx
        .storage
        .hybrid_search(&source_table_id, &query_embedding, candidate_pool)
        .await?;
    if candidates.is_empty() {
        return Ok(References::empty(source_table_id));
    }

    // Step 4: rerank, keep top-k, apply the score threshold.
    ctx.quota.check_rerank_quota(ctx.params.reranking_model()).await?;
    let candidate_texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
    let ranked = ctx.reranker.rerank(&query, &candidate_texts).await?;

    let k = *ctx.params.k() as usize;
    let threshold = *ctx.params.rerank_score_threshold();
    let mut chunks = Vec::with_capacity(k);
    for (index, score) in ranked.into_iter() {
        if chunks.len() >= k {
            break;
        }
        if let Some(min_score) = threshold {
            if score < min_score {
                continue;
            }
        }
        if let Some(chunk) = candidates.get(index) {
            let mut chunk = chunk.clone();
            chunk.metadata = merge_score(chunk.metadata, score);
            chunks.push(chunk);
        }
    }

    // Step 5: emit rerank usage (one search per RAG invocation).
    let usage = UsageEvent::rerank(
        ctx.org_id.to_string(),
        ctx.project_id.to_string(),
        ctx.params.reranking_model().clone(),
        1,
        now_ms(),
    );
    ctx.quota.record_event(usage);

    // Step 6: return the retained references.
    Ok(References { source_table_id, chunks })
}

fn merge_score(metadata: serde_json::Value, score: f32) -> serde_json::Value {
    match metadata {
        serde_json::Value::Object(mut map) => {
            map.insert("rerank_score".to_string(), serde_json::json!(score));
            serde_json::Value::Object(map)
        }
        other => serde_json::json!({ "value": other, "rerank_score": score }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gentable_core::{EmbedConfig, GenConfig};
    use serde_json::json;

    fn chunk(text: &str) -> ReferenceChunk {
        ReferenceChunk {
            text: text.to_string(),
            title: None,
            page: None,
            file_name: None,
            metadata: json!({}),
        }
    }

    #[test]
    fn merge_score_adds_field_to_object_metadata() {
        let merged = merge_score(json!({"row_id": "r1"}), 0.82);
        assert_eq!(merged["row_id"], "r1");
        assert_eq!(merged["rerank_score"], 0.82);
    }

    #[test]
    fn chunk_builder_is_well_formed() {
        let c = chunk("hello");
        assert_eq!(c.text, "hello");
        let _ = GenConfig::Embed(EmbedConfig::new("m".to_string(), "body".to_string()));
    }
}
