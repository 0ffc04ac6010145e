//! Diesel row types for durable usage/progress persistence, and their
//! conversions to/from `gentable_core`'s in-memory types.

use crate::schema::{progress_records, usage_events};
use diesel::prelude::*;
use gentable_core::{ProgressRecord, ProgressState, UsageEvent, UsageKind};
use std::collections::HashMap;

/// A persisted usage event row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = usage_events)]
pub struct UsageEventRow {
    /// Auto-assigned primary key.
    pub id: i64,
    /// Billable category, as its `snake_case` name.
    pub kind: String,
    /// Owning organization.
    pub org_id: String,
    /// Owning project.
    pub project_id: String,
    /// The model invoked, if applicable.
    pub model: Option<String>,
    /// Input tokens consumed.
    pub prompt_tokens: Option<i64>,
    /// Output tokens consumed.
    pub completion_tokens: Option<i64>,
    /// Retrieval search count.
    pub searches: Option<i32>,
    /// Gibibytes transferred or stored.
    pub gib: Option<f64>,
    /// Event timestamp, milliseconds since the epoch.
    pub ts: i64,
}

/// An insertable usage event row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = usage_events)]
pub struct NewUsageEventRow {
    /// Billable category, as its `snake_case` name.
    pub kind: String,
    /// Owning organization.
    pub org_id: String,
    /// Owning project.
    pub project_id: String,
    /// The model invoked, if applicable.
    pub model: Option<String>,
    /// Input tokens consumed.
    pub prompt_tokens: Option<i64>,
    /// Output tokens consumed.
    pub completion_tokens: Option<i64>,
    /// Retrieval search count.
    pub searches: Option<i32>,
    /// Gibibytes transferred or stored.
    pub gib: Option<f64>,
    /// Event timestamp, milliseconds since the epoch.
    pub ts: i64,
}

fn usage_kind_to_str(kind: UsageKind) -> &'static str {
    match kind {
        UsageKind::Llm => "llm",
        UsageKind::Embed => "embed",
        UsageKind::Rerank => "rerank",
        UsageKind::Egress => "egress",
        UsageKind::Db => "db",
        UsageKind::File => "file",
        UsageKind::Image => "image",
    }
}

fn usage_kind_from_str(kind: &str) -> Option<UsageKind> {
    match kind {
        "llm" => Some(UsageKind::Llm),
        "embed" => Some(UsageKind::Embed),
        "rerank" => Some(UsageKind::Rerank),
        "egress" => Some(UsageKind::Egress),
        "db" => Some(UsageKind::Db),
        "file" => Some(UsageKind::File),
        "image" => Some(UsageKind::Image),
        _ => None,
    }
}

impl From<&UsageEvent> for NewUsageEventRow {
    fn from(event: &UsageEvent) -> Self {
        Self {
            kind: usage_kind_to_str(event.kind).to_string(),
            org_id: event.org_id.clone(),
            project_id: event.project_id.clone(),
            model: event.model.clone(),
            prompt_tokens: event.prompt_tokens.map(|t| t as i64),
            completion_tokens: event.completion_tokens.map(|t| t as i64),
            searches: event.searches.map(|s| s as i32),
            gib: event.gib,
            ts: event.ts,
        }
    }
}

impl TryFrom<UsageEventRow> for UsageEvent {
    type Error = String;

    fn try_from(row: UsageEventRow) -> Result<Self, Self::Error> {
        let kind = usage_kind_from_str(&row.kind).ok_or_else(|| format!("unknown usage kind: {}", row.kind))?;
        Ok(UsageEvent {
            kind,
            org_id: row.org_id,
            project_id: row.project_id,
            model: row.model,
            prompt_tokens: row.prompt_tokens.map(|t| t as u64),
            completion_tokens: row.completion_tokens.map(|t| t as u64),
            searches: row.searches.map(|s| s as u32),
            gib: row.gib,
            ts: row.ts,
        })
    }
}

/// A persisted progress record row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = progress_records)]
pub struct ProgressRecordRow {
    /// The request-supplied key.
    pub key: String,
    /// Lifecycle state, as its `snake_case` name.
    pub state: String,
    /// Failure message, if `state == "failed"`.
    pub error: Option<String>,
    /// Named stages mapped to completion percentage, as a JSON object.
    pub stages: serde_json::Value,
    /// Last-write timestamp (drives the TTL-extend-on-write semantics at
    /// the cache layer; this table retains history past the cache's TTL).
    pub updated_at: chrono::NaiveDateTime,
}

/// An insertable/upsertable progress record row.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = progress_records)]
pub struct NewProgressRecordRow {
    /// The request-supplied key.
    pub key: String,
    /// Lifecycle state, as its `snake_case` name.
    pub state: String,
    /// Failure message, if `state == "failed"`.
    pub error: Option<String>,
    /// Named stages mapped to completion percentage, as a JSON object.
    pub stages: serde_json::Value,
    /// Last-write timestamp.
    pub updated_at: chrono::NaiveDateTime,
}

fn progress_state_to_str(state: ProgressState) -> &'static str {
    match state {
        ProgressState::Started => "started",
        ProgressState::Completed => "completed",
        ProgressState::Failed => "failed",
    }
}

fn progress_state_from_str(state: &str) -> Option<ProgressState> {
    match state {
        "started" => Some(ProgressState::Started),
        "completed" => Some(ProgressState::Completed),
        "failed" => Some(ProgressState::Failed),
        _ => None,
    }
}

impl NewProgressRecordRow {
    /// Build an upsertable row from a live progress record, stamped with
    /// the write time.
    pub fn from_record(record: &ProgressRecord, updated_at: chrono::NaiveDateTime) -> Self {
        Self {
            key: record.key.clone(),
            state: progress_state_to_str(record.state).to_string(),
            error: record.error.clone(),
            stages: serde_json::json!(record.stages),
            updated_at,
        }
    }
}

impl TryFrom<ProgressRecordRow> for ProgressRecord {
    type Error = String;

    fn try_from(row: ProgressRecordRow) -> Result<Self, Self::Error> {
        let state = progress_state_from_str(&row.state).ok_or_else(|| format!("unknown progress state: {}", row.state))?;
        let stages: HashMap<String, u8> =
            serde_json::from_value(row.stages).map_err(|err| format!("malformed stages JSON: {err}"))?;
        Ok(ProgressRecord { key: row.key, state, error: row.error, stages })
    }
}
