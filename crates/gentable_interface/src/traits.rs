//! Provider traits: the seam the generator dispatchers (spec §4.C) call
//! through, independent of any particular vendor client.

use crate::{HealthStatus, ModelMetadata, ToolDefinition};
use async_trait::async_trait;
use futures_util::stream::Stream;
use gentable_core::{GenerateChunk, GenerateRequest, GenerateResponse};
use gentable_error::GentableResult;
use std::pin::Pin;

/// Core trait every language-model backend must implement. `LLMGen` (spec
/// §4.C) dispatches through this trait rather than any vendor SDK.
#[async_trait]
pub trait LmEngine: Send + Sync {
    /// Generate a complete response for a multimodal request.
    async fn generate(&self, req: &GenerateRequest) -> GentableResult<GenerateResponse>;

    /// Provider name (e.g., "anthropic", "openai", "gemini").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Trait for models that can stream chunks rather than a single response.
/// Streamed requests are the common path for `LLMGen`; non-streaming
/// requests synthesize one terminal chunk (spec §4.C step 4).
#[async_trait]
pub trait Streaming: LmEngine {
    /// Stream chunks as they arrive from the provider.
    async fn generate_stream(
        &self,
        req: &GenerateRequest,
    ) -> GentableResult<Pin<Box<dyn Stream<Item = GentableResult<GenerateChunk>> + Send>>>;
}

/// Trait for models that support function/tool calling (spec §3 `LLM.tools?`).
#[async_trait]
pub trait ToolUse: LmEngine {
    /// Generate with available tools/functions. The response may contain
    /// tool calls instead of, or in addition to, text output.
    async fn generate_with_tools(
        &self,
        req: &GenerateRequest,
        tools: &[ToolDefinition],
    ) -> GentableResult<GenerateResponse>;

    /// Maximum number of tools that can be provided.
    fn max_tools(&self) -> usize {
        128
    }
}

/// Trait for models that support structured JSON output.
#[async_trait]
pub trait JsonMode: LmEngine {
    /// Generate output conforming to a JSON schema.
    async fn generate_json(
        &self,
        req: &GenerateRequest,
        schema: &serde_json::Value,
    ) -> GentableResult<serde_json::Value>;
}

/// Trait for counting tokens ahead of dispatch, used by the quota manager's
/// pre-flight check (spec §4.C step 3 "estimated_prompt_tokens").
pub trait TokenCounting: LmEngine {
    /// Count tokens in a span of text using the model's tokenizer.
    fn count_tokens(&self, text: &str) -> GentableResult<usize>;

    /// Count tokens across every text input of a request.
    fn count_request_tokens(&self, req: &GenerateRequest) -> GentableResult<usize> {
        let mut total = 0;
        for msg in &req.messages {
            for input in &msg.content {
                if let gentable_core::Input::Text(text) = input {
                    total += self.count_tokens(text)?;
                }
            }
        }
        Ok(total)
    }
}

/// Trait for querying a provider's capabilities and limits.
pub trait Metadata: LmEngine {
    /// Comprehensive metadata about this model.
    fn metadata(&self) -> ModelMetadata;

    /// Maximum tokens in input context.
    fn max_input_tokens(&self) -> usize {
        self.metadata().max_input_tokens
    }

    /// Maximum tokens in output.
    fn max_output_tokens(&self) -> usize {
        self.metadata().max_output_tokens
    }
}

/// Trait for backends that support health checks.
#[async_trait]
pub trait Health: Send + Sync {
    /// Check if the backend is available and functioning.
    async fn health(&self) -> GentableResult<HealthStatus>;
}

/// The embedding backend `EmbedGen` (spec §4.C) and the RAG sub-step's query
/// embedding step (spec §4.D step 2) dispatch through.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one or more text inputs, returning one vector per input.
    async fn embed(&self, inputs: &[String]) -> GentableResult<Vec<Vec<f32>>>;

    /// Output vector dimensionality.
    fn dimensions(&self) -> u32;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// The reranking backend the RAG sub-step (spec §4.D step 4) dispatches
/// through. Returns `(candidate_index, score)` pairs sorted best-first.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank `candidates` against `query`, returning every candidate's
    /// index and score, best-first.
    async fn rerank(
        &self,
        query: &str,
        candidates: &[String],
    ) -> GentableResult<Vec<(usize, f32)>>;

    /// Model identifier.
    fn model_name(&self) -> &str;
}
