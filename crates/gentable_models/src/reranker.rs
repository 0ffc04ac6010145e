//! A [`Reranker`] built from any [`Embedder`], scoring candidates by cosine
//! similarity to the query embedding rather than calling a dedicated rerank
//! model/endpoint.
//!
//! The RAG sub-step (spec §4.D step 4) only needs *some* reranker in the
//! `DispatchContext`; a provider-agnostic embedding-based one means every
//! `Embedder` this crate (or any other) implements doubles as a reranker for
//! free, with no extra vendor surface to integrate.

use async_trait::async_trait;
use gentable_error::GentableResult;
use gentable_interface::{Embedder, Reranker};
use std::sync::Arc;

/// Reranks by cosine similarity between the query's embedding and each
/// candidate's embedding, both produced by the wrapped `Embedder`.
pub struct EmbeddingReranker<E: Embedder> {
    embedder: Arc<E>,
}

impl<E: Embedder> EmbeddingReranker<E> {
    /// Wrap `embedder` as a reranker.
    pub fn new(embedder: Arc<E>) -> Self {
        Self { embedder }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl<E: Embedder> Reranker for EmbeddingReranker<E> {
    async fn rerank(&self, query: &str, candidates: &[String]) -> GentableResult<Vec<(usize, f32)>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut inputs = Vec::with_capacity(candidates.len() + 1);
        inputs.push(query.to_string());
        inputs.extend(candidates.iter().cloned());

        let mut vectors = self.embedder.embed(&inputs).await?;
        let query_vector = vectors.remove(0);

        let mut scored: Vec<(usize, f32)> =
            vectors.iter().enumerate().map(|(i, v)| (i, cosine_similarity(&query_vector, v))).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(scored)
    }

    fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, inputs: &[String]) -> GentableResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Each stub vector encodes the input's length, so "closer"
            // lengths to the query produce a higher cosine similarity.
            Ok(inputs.iter().map(|s| vec![s.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> u32 {
            2
        }

        fn model_name(&self) -> &str {
            "stub-embedder"
        }
    }

    #[tokio::test]
    async fn reranks_candidates_by_similarity_to_query() {
        let embedder = Arc::new(StubEmbedder { calls: AtomicUsize::new(0) });
        let reranker = EmbeddingReranker::new(embedder);
        let ranked = reranker
            .rerank("abc", &["abc exactly".to_string(), "z".to_string()])
            .await
            .unwrap();
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].1 >= ranked[1].1);
    }

    #[tokio::test]
    async fn empty_candidates_short_circuits_without_embedding() {
        let embedder = Arc::new(StubEmbedder { calls: AtomicUsize::new(0) });
        let reranker = EmbeddingReranker::new(embedder);
        let ranked = reranker.rerank("abc", &[]).await.unwrap();
        assert!(ranked.is_empty());
    }
}
