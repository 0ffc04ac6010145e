//! Quota/billing manager seam (spec §4.G), implemented concretely by
//! `gentable_quota`.

use async_trait::async_trait;
use gentable_core::UsageEvent;
use gentable_error::GentableResult;

/// Pre-flight checks and usage accounting for one request.
///
/// A `QuotaManager` is constructed once per request (it accumulates that
/// request's usage events and running totals) and is otherwise reached only
/// through this trait by the generator dispatchers and the RAG sub-step.
#[async_trait]
pub trait QuotaManager: Send + Sync {
    /// Pre-flight check before an `LLMGen` dispatch (spec §4.C step 3).
    /// Raises `UpgradeTier`/`InsufficientCredits` if the organization's LLM
    /// counter has exceeded its cap.
    async fn check_llm_quota(&self, model: &str, estimated_prompt_tokens: u64) -> GentableResult<()>;

    /// Pre-flight check before an `EmbedGen` dispatch.
    async fn check_embed_quota(&self, model: &str, estimated_tokens: u64) -> GentableResult<()>;

    /// Pre-flight check before a RAG sub-step's rerank call (spec §4.D step 5).
    async fn check_rerank_quota(&self, model: &str) -> GentableResult<()>;

    /// Pre-flight check on network egress.
    async fn check_egress_quota(&self, gib: f64) -> GentableResult<()>;

    /// Pre-flight check on durable storage writes.
    async fn check_db_quota(&self, gib: f64) -> GentableResult<()>;

    /// Pre-flight check on file storage.
    async fn check_file_quota(&self, gib: f64) -> GentableResult<()>;

    /// Append one usage event to this request's in-memory accumulator and
    /// update its running total (spec §4.G `create_<kind>_events`).
    fn record_event(&self, event: UsageEvent);

    /// Push the accumulated events into the durable buffer and update the
    /// organization's tiered cost. Called exactly once per request, on
    /// success or failure; idempotent (spec §4.G, §9 "At-most-once billing").
    async fn process_all(&self) -> GentableResult<()>;
}
