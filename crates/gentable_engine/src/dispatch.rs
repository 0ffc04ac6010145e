//! Generator dispatchers (spec §4.C): `LLMGen`, `EmbedGen`, `PythonGen`.
//!
//! Each dispatcher resolves its column's templates against the row draft,
//! invokes its backend through the `gentable_interface` trait seam, and
//! yields [`CellChunk`]s the row executor folds into `Row` state. Usage is
//! recorded on the quota manager as soon as it's known, never deferred to
//! `process_all`.

use crate::rag::{RagContext, run_rag};
use async_stream::try_stream;
use futures_util::{Stream, StreamExt};
use gentable_core::{
    EmbedConfig, GenerateRequest, Input, LlmConfig, Message, PythonConfig, References, Role, Row,
    UsageEvent, Value,
};
use gentable_error::{EngineError, GentableError, GentableResult, ProviderError, RetryableError};
use gentable_interface::{CodeSandbox, Embedder, QuotaManager, Reranker, Streaming, StorageEngine};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// The backends and per-request collaborators a generator dispatch needs.
/// Assembled once per request and shared across every cell it dispatches.
pub struct DispatchContext {
    /// Owning organization, stamped onto every usage event.
    pub org_id: String,
    /// Owning project, stamped onto every usage event.
    pub project_id: String,
    /// Pre-flight quota checks and usage accounting for this request.
    pub quota: Arc<dyn QuotaManager>,
    /// Language-model backends, keyed by model identifier.
    pub lm_engines: HashMap<String, Arc<dyn Streaming>>,
    /// Embedding backends, keyed by model identifier.
    pub embedders: HashMap<String, Arc<dyn Embedder>>,
    /// Reranking backends, keyed by model identifier.
    pub rerankers: HashMap<String, Arc<dyn Reranker>>,
    /// Row persistence and hybrid search, for the RAG sub-step.
    pub storage: Arc<dyn StorageEngine>,
    /// The sandboxed Python backend `PythonGen` dispatches through.
    pub sandbox: Arc<dyn CodeSandbox>,
    /// The embedding model that embeds each knowledge table's vector column,
    /// keyed by knowledge table id. Resolved once by the caller from each
    /// referenced knowledge table's schema before the request is dispatched
    /// (spec §4.D step 2: "embed the query with the knowledge table's
    /// embedding model").
    pub knowledge_embedding_models: HashMap<String, String>,
}

/// One chunk yielded by a generator dispatcher.
#[derive(Debug, Clone)]
pub enum CellChunk {
    /// Leading chunk carrying retrieved citations, emitted before any text
    /// when a RAG sub-step ran (spec §4.D, empty `References` is legal).
    References(References),
    /// An incremental text delta.
    TextDelta(String),
    /// The terminal chunk: the cell's final materialized value, finish
    /// reason, and (if billable) the usage event already recorded with the
    /// quota manager.
    Terminal {
        /// The cell's final value.
        value: Value,
        /// Why generation stopped (`"stop"`, `"length"`, `"error"`).
        finish_reason: String,
        /// The usage event recorded for this dispatch, if any.
        usage: Option<UsageEvent>,
    },
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Rough token estimate for a quota precheck, ahead of knowing the
/// provider's actual tokenizer output (the same `len / 4` heuristic a
/// Gemini client uses for its own rate-limiter precheck before a real
/// token count is available).
fn estimate_tokens(text: &str) -> u64 {
    (text.len() / 4).max(1) as u64
}

fn render_column(row: &Row, column: &str) -> String {
    row.get(column).map(|v| v.render_for_template()).unwrap_or_default()
}

fn estimate_input_tokens(input: &Input) -> u64 {
    match input {
        Input::Text(text) => estimate_tokens(text),
        _ => 0,
    }
}

/// Dispatch an `LLMGen` output column (spec §4.C): resolve templates, run
/// an optional RAG sub-step, precheck quota, invoke the model, and yield
/// `References` (if RAG ran), then `TextDelta`s, then a `Terminal` chunk.
///
/// `history` carries prior turns for a `multi_turn` column (spec §4.E S6:
/// "the LLM prompt includes all prior rows of the multi-turn column"),
/// already rendered into alternating user/assistant messages by the caller;
/// empty for non-chat columns.
pub fn dispatch_llm<'a>(
    ctx: &'a DispatchContext,
    config: &'a LlmConfig,
    row: &'a Row,
    history: &'a [Message],
    rag: Option<RagContext<'a>>,
) -> Pin<Box<dyn Stream<Item = GentableResult<CellChunk>> + Send + 'a>> {
    Box::pin(try_stream! {
        let engine = ctx
            .lm_engines
            .get(config.model())
            .cloned()
            .ok_or_else(|| EngineError::internal(format!("no LmEngine registered for model {}", config.model())))?;

        let system_prompt = config.system_prompt_template().render(|col| render_column(row, col));
        let user_prompt = config.user_prompt_template().render(|col| render_column(row, col));

        let mut references = None;
        if let Some(rag) = rag {
            let result = run_rag(&rag, row).await?;
            yield CellChunk::References(result.clone());
            references = Some(result);
        }

        let estimated = estimate_tokens(&system_prompt) + estimate_tokens(&user_prompt)
            + history.iter().flat_map(|m| &m.content).map(estimate_input_tokens).sum::<u64>();
        ctx.quota.check_llm_quota(config.model(), estimated).await?;

        let mut messages = Vec::new();
        if !system_prompt.is_empty() {
            messages.push(Message { role: Role::System, content: vec![Input::Text(system_prompt)] });
        }
        messages.extend(history.iter().cloned());
        messages.push(Message { role: Role::User, content: vec![Input::Text(user_prompt)] });

        let request = GenerateRequest {
            messages,
            max_tokens: *config.max_tokens(),
            temperature: *config.temperature(),
            model: Some(config.model().clone()),
        };

        let mut stream = establish_stream(engine.as_ref(), &request).await?;

        let mut text = String::new();
        let mut prompt_tokens = 0u64;
        let mut completion_tokens = 0u64;
        let mut finish_reason = "stop".to_string();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(delta) = chunk.delta_text {
                if !delta.is_empty() {
                    text.push_str(&delta);
                    yield CellChunk::TextDelta(delta);
                }
            }
            if let Some(reason) = chunk.finish_reason {
                finish_reason = reason;
                prompt_tokens = chunk.prompt_tokens.unwrap_or(0);
                completion_tokens = chunk.completion_tokens.unwrap_or(0);
                break;
            }
        }

        let usage = UsageEvent::llm(
            ctx.org_id.clone(),
            ctx.project_id.clone(),
            config.model().clone(),
            prompt_tokens,
            completion_tokens,
            now_ms(),
        );
        ctx.quota.record_event(usage.clone());

        let value = Value::Str(text);
        let _ = references;
        yield CellChunk::Terminal { value, finish_reason, usage: Some(usage) };
    })
}

/// Retry stream establishment up to three times on a retriable provider
/// error (spec §4.C step 5); context overflow and other permanent errors
/// fail immediately. Only the call that opens the stream is retried — once
/// bytes have started flowing, a mid-stream failure surfaces as-is, since
/// resuming a partially-consumed stream is vendor-specific and out of
/// scope here.
async fn establish_stream(
    engine: &(dyn Streaming + '_),
    request: &GenerateRequest,
) -> GentableResult<Pin<Box<dyn Stream<Item = GentableResult<gentable_core::GenerateChunk>> + Send>>> {
    let first = engine.generate_stream(request).await;
    let provider_err = match first {
        Ok(stream) => return Ok(stream),
        Err(err) => match as_provider_error(&err) {
            Some(provider_err) if provider_err.is_retryable() => provider_err,
            _ => return Err(err),
        },
    };

    let (initial_ms, max_retries, max_delay_secs) = provider_err.retry_strategy_params();
    let strategy = ExponentialBackoff::from_millis(initial_ms)
        .factor(2)
        .max_delay(Duration::from_secs(max_delay_secs))
        .map(jitter)
        .take(max_retries);

    Retry::spawn(strategy, || async {
        match engine.generate_stream(request).await {
            Ok(stream) => Ok(stream),
            Err(err) => match as_provider_error(&err) {
                Some(provider_err) if provider_err.is_retryable() => {
                    warn!(error = %err, "LLM stream establishment failed, retrying");
                    Err(RetryError::Transient { err, retry_after: None })
                }
                _ => Err(RetryError::Permanent(err)),
            },
        }
    })
    .await
}

fn as_provider_error(err: &GentableError) -> Option<ProviderError> {
    match err.kind() {
        gentable_error::GentableErrorKind::Provider(provider_err) => Some(provider_err.clone()),
        _ => None,
    }
}

/// Dispatch an `EmbedGen` output column (spec §4.C): render the source
/// column, precheck quota, embed, and yield a single `Terminal` chunk. No
/// streaming or retrieval applies to embeddings.
pub async fn dispatch_embed(
    ctx: &DispatchContext,
    config: &EmbedConfig,
    row: &Row,
) -> GentableResult<CellChunk> {
    let embedder = ctx
        .embedders
        .get(config.embedding_model())
        .cloned()
        .ok_or_else(|| {
            EngineError::internal(format!(
                "no Embedder registered for model {}",
                config.embedding_model()
            ))
        })?;

    let text = render_column(row, config.source_column());
    let estimated = estimate_tokens(&text);
    ctx.quota.check_embed_quota(config.embedding_model(), estimated).await?;

    debug!(model = %config.embedding_model(), "dispatching EmbedGen");
    let mut vectors = embedder.embed(&[text.clone()]).await?;
    let vector = vectors.pop().unwrap_or_default();

    let usage = UsageEvent::embed(
        ctx.org_id.clone(),
        ctx.project_id.clone(),
        config.embedding_model().clone(),
        estimated,
        now_ms(),
    );
    ctx.quota.record_event(usage.clone());

    Ok(CellChunk::Terminal {
        value: Value::Vector(vector),
        finish_reason: "stop".to_string(),
        usage: Some(usage),
    })
}

/// Dispatch a `PythonGen` output column (spec §4.C): run the snippet in the
/// code sandbox against the row's materialized values, and yield a single
/// `Terminal` chunk. Not billable (no `UsageKind` category covers sandboxed
/// compute), so `usage` is always `None`.
pub async fn dispatch_python(
    ctx: &DispatchContext,
    config: &PythonConfig,
    row: &Row,
) -> GentableResult<CellChunk> {
    debug!("dispatching PythonGen");
    let output = ctx.sandbox.run(config.code(), row.values()).await?;
    Ok(CellChunk::Terminal {
        value: output.result,
        finish_reason: "stop".to_string(),
        usage: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tokens_never_returns_zero_for_nonempty_text() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("ab"), 1);
        assert_eq!(estimate_tokens(&"a".repeat(40)), 10);
    }
}
