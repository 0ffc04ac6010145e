//! Progress records for long-running operations (spec §3, §4.I).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The lifecycle state of a progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    /// The operation has begun.
    Started,
    /// The operation finished successfully.
    Completed,
    /// The operation finished with an error.
    Failed,
}

/// Keyed status of a long-running operation (import, embed file, reindex),
/// overwritable while in flight and auto-expiring on completion (spec §4.I).
///
/// # Examples
///
/// ```
/// use gentable_core::{ProgressRecord, ProgressState};
///
/// let mut record = ProgressRecord::started("import:req_1".to_string());
/// record.set_stage("parse".to_string(), 40);
/// assert_eq!(record.state, ProgressState::Started);
///
/// record.complete();
/// assert_eq!(record.state, ProgressState::Completed);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// The request-supplied key, e.g. `"import:<token>"`.
    pub key: String,
    /// The lifecycle state.
    pub state: ProgressState,
    /// The failure message, set only when `state == Failed`.
    pub error: Option<String>,
    /// Named stages mapped to their completion percentage (0-100).
    pub stages: HashMap<String, u8>,
}

impl ProgressRecord {
    /// Create a new `Started` record.
    pub fn started(key: String) -> Self {
        Self {
            key,
            state: ProgressState::Started,
            error: None,
            stages: HashMap::new(),
        }
    }

    /// Update one stage's completion percentage. Every write extends this
    /// record's TTL (enforced by the cache layer storing it, not by this type).
    pub fn set_stage(&mut self, name: String, percent: u8) {
        self.stages.insert(name, percent.min(100));
    }

    /// Mark the record completed.
    pub fn complete(&mut self) {
        self.state = ProgressState::Completed;
        self.error = None;
    }

    /// Mark the record failed with the given message.
    pub fn fail(&mut self, error: String) {
        self.state = ProgressState::Failed;
        self.error = Some(error);
    }
}
