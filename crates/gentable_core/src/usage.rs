//! Metering events emitted by the quota/billing manager (spec §3, §4.G).

use serde::{Deserialize, Serialize};

/// The billable category of a usage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    /// Language-model generation.
    Llm,
    /// Embedding generation.
    Embed,
    /// Reranking during a RAG sub-step.
    Rerank,
    /// Network egress.
    Egress,
    /// Durable storage writes.
    Db,
    /// File storage.
    File,
    /// Image generation.
    Image,
}

/// One billable unit consumed while servicing a request.
///
/// # Examples
///
/// ```
/// use gentable_core::{UsageEvent, UsageKind};
///
/// let event = UsageEvent::llm(
///     "org_1".to_string(),
///     "proj_1".to_string(),
///     "gemini-2.0-flash-lite".to_string(),
///     120,
///     48,
///     1_700_000_000_000,
/// );
/// assert_eq!(event.kind, UsageKind::Llm);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// The billable category.
    pub kind: UsageKind,
    /// Owning organization.
    pub org_id: String,
    /// Owning project.
    pub project_id: String,
    /// The model invoked, for `Llm`/`Embed`/`Rerank`/`Image` events.
    pub model: Option<String>,
    /// Input tokens consumed, for `Llm`/`Embed` events.
    pub prompt_tokens: Option<u64>,
    /// Output tokens consumed, for `Llm` events.
    pub completion_tokens: Option<u64>,
    /// Number of retrieval searches performed, for `Rerank` events.
    pub searches: Option<u32>,
    /// Gibibytes transferred or stored, for `Egress`/`Db`/`File` events.
    pub gib: Option<f64>,
    /// Event timestamp, milliseconds since the epoch.
    pub ts: i64,
}

impl UsageEvent {
    /// Construct a `Llm` usage event.
    pub fn llm(
        org_id: String,
        project_id: String,
        model: String,
        prompt_tokens: u64,
        completion_tokens: u64,
        ts: i64,
    ) -> Self {
        Self {
            kind: UsageKind::Llm,
            org_id,
            project_id,
            model: Some(model),
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
            searches: None,
            gib: None,
            ts,
        }
    }

    /// Construct an `Embed` usage event.
    pub fn embed(org_id: String, project_id: String, model: String, token_count: u64, ts: i64) -> Self {
        Self {
            kind: UsageKind::Embed,
            org_id,
            project_id,
            model: Some(model),
            prompt_tokens: Some(token_count),
            completion_tokens: None,
            searches: None,
            gib: None,
            ts,
        }
    }

    /// Construct a `Rerank` usage event.
    pub fn rerank(org_id: String, project_id: String, model: String, searches: u32, ts: i64) -> Self {
        Self {
            kind: UsageKind::Rerank,
            org_id,
            project_id,
            model: Some(model),
            prompt_tokens: None,
            completion_tokens: None,
            searches: Some(searches),
            gib: None,
            ts,
        }
    }
}
