//! Rows and their auxiliary state (spec §3 "Row").

use crate::{References, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The auxiliary metadata carried in a `<col>_` state column alongside an
/// output column's value.
///
/// # Examples
///
/// ```
/// use gentable_core::CellState;
///
/// let ok = CellState::ok(Some("stop".to_string()));
/// assert!(ok.error.is_none());
///
/// let failed = CellState::error("context overflow".to_string());
/// assert!(failed.is_null);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CellState {
    /// Whether the paired data column holds no value.
    pub is_null: bool,
    /// The error message, if this cell failed (testable property 4: exactly
    /// one of `error` / non-null data value holds).
    pub error: Option<String>,
    /// Retrieved citations, for LLM columns with RAG configured.
    pub references: Option<References>,
    /// The reason generation stopped (`"stop"`, `"length"`, `"error"`, etc.).
    pub finish_reason: Option<String>,
}

impl CellState {
    /// A successful cell state.
    pub fn ok(finish_reason: Option<String>) -> Self {
        Self {
            is_null: false,
            error: None,
            references: None,
            finish_reason,
        }
    }

    /// A fatally failed cell state.
    pub fn error(message: String) -> Self {
        Self {
            is_null: true,
            error: Some(message),
            references: None,
            finish_reason: Some("error".to_string()),
        }
    }

    /// A cell that was never run because an upstream dependency failed
    /// (spec §4.E: "skipped-due-to-dep-error").
    pub fn skipped_due_to_dependency(failed_column: &str) -> Self {
        Self::error(format!("upstream column {failed_column} failed"))
    }

    /// Attach retrieved citations to an otherwise-successful state.
    pub fn with_references(mut self, references: References) -> Self {
        self.references = Some(references);
        self
    }
}

/// Whether a row is still being assembled or has all output columns
/// materialized (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    /// Not all output columns have been materialized; visible only to the executor.
    Draft,
    /// All output columns have been materialized.
    Closed,
}

/// A mapping from column id to value, plus state-column entries for every
/// output column.
///
/// # Examples
///
/// ```
/// use gentable_core::{Row, Value};
///
/// let mut row = Row::draft("row_1".to_string());
/// row.set("title".to_string(), Value::Str("Hello".to_string()));
/// assert_eq!(row.get("title"), Some(&Value::Str("Hello".to_string())));
/// assert_eq!(row.status(), gentable_core::RowStatus::Draft);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    id: String,
    values: HashMap<String, Value>,
    state: HashMap<String, CellState>,
    status: RowStatus,
    /// Monotonic timestamp of the last write, in milliseconds since the
    /// epoch. Assigned by the caller on commit; `None` for an in-flight draft.
    updated_at: Option<i64>,
}

impl Row {
    /// Construct a new, empty draft row with the given id.
    pub fn draft(id: String) -> Self {
        Self {
            id,
            values: HashMap::new(),
            state: HashMap::new(),
            status: RowStatus::Draft,
            updated_at: None,
        }
    }

    /// The row id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set a data column's value.
    pub fn set(&mut self, column: String, value: Value) {
        self.values.insert(column, value);
    }

    /// Get a data column's value.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Whether a data column already has a non-null value supplied (used by
    /// the batch planner's `to_generate` computation, spec §4.B rule 3).
    pub fn has_value(&self, column: &str) -> bool {
        self.values.get(column).map(|v| !v.is_null()).unwrap_or(false)
    }

    /// Set an output column's auxiliary state.
    pub fn set_state(&mut self, column: String, state: CellState) {
        self.state.insert(column, state);
    }

    /// Get an output column's auxiliary state.
    pub fn state(&self, column: &str) -> Option<&CellState> {
        self.state.get(column)
    }

    /// All materialized data values.
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// All state entries.
    pub fn states(&self) -> &HashMap<String, CellState> {
        &self.state
    }

    /// Whether this row is closed or still a draft.
    pub fn status(&self) -> RowStatus {
        self.status
    }

    /// Close this row, stamping `UpdatedAt`. Called once every output column
    /// is materialized (spec §4.F step 5).
    pub fn close(&mut self, updated_at_ms: i64) {
        self.status = RowStatus::Closed;
        self.updated_at = Some(updated_at_ms);
    }

    /// The `UpdatedAt` timestamp, if closed.
    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_state_carries_no_error_and_is_not_null() {
        let state = CellState::ok(Some("stop".to_string()));
        assert!(!state.is_null);
        assert!(state.error.is_none());
    }

    #[test]
    fn error_state_is_null_with_a_nonempty_message() {
        let state = CellState::error("context overflow".to_string());
        assert!(state.is_null);
        assert!(state.error.as_deref().is_some_and(|m| !m.is_empty()));
        assert_eq!(state.finish_reason.as_deref(), Some("error"));
    }

    #[test]
    fn skipped_due_to_dependency_names_the_failed_column() {
        let state = CellState::skipped_due_to_dependency("summary");
        assert!(state.is_null);
        assert_eq!(state.error.as_deref(), Some("upstream column summary failed"));
    }

    #[test]
    fn has_value_is_false_for_an_unset_column_and_for_an_explicit_null() {
        let mut row = Row::draft("row_1".to_string());
        assert!(!row.has_value("title"));
        row.set("title".to_string(), Value::Null);
        assert!(!row.has_value("title"));
        row.set("title".to_string(), Value::Str("Hello".to_string()));
        assert!(row.has_value("title"));
    }

    #[test]
    fn draft_row_closes_to_a_stamped_updated_at() {
        let mut row = Row::draft("row_1".to_string());
        assert_eq!(row.status(), RowStatus::Draft);
        assert!(row.updated_at().is_none());
        row.close(1_700_000_000_000);
        assert_eq!(row.status(), RowStatus::Closed);
        assert_eq!(row.updated_at(), Some(1_700_000_000_000));
    }
}
