//! Language-model provider integrations.
//!
//! [`gemini::GeminiClient`] and [`gemini::GeminiEmbedder`] are the concrete
//! backends `LLMGen`/`EmbedGen` (spec §4.C) dispatch through, reached only
//! via the [`gentable_interface`] traits they implement — the rest of the
//! engine never names a vendor type. [`reranker::EmbeddingReranker`] turns
//! any `Embedder` into a `Reranker` by cosine similarity, for deployments
//! that don't have a dedicated rerank endpoint.

mod gemini;
mod metrics;
mod reranker;

pub use gemini::{GeminiClient, GeminiEmbedder};
pub use metrics::{classify_error, LlmMetrics};
pub use reranker::EmbeddingReranker;
