//! Execution-engine error types: schema validation, row-write requests,
//! cancellation, and catch-all internal faults.
//!
//! Maps to spec §7's "Bad input", "Resource not found / conflict",
//! "Cancellation", and "Internal error" categories.

/// Kinds of engine-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum EngineErrorKind {
    /// A generation config references a column that does not exist.
    #[display("Unknown column referenced: {}", _0)]
    UnknownColumn(String),
    /// A generation config references a column at or to the right of itself.
    #[display("Column '{}' references '{}', which is not strictly to its left", holder, reference)]
    ReferenceNotLeft {
        /// The column whose generation config holds the bad reference.
        holder: String,
        /// The column referenced.
        reference: String,
    },
    /// The dependency graph over output columns contains a cycle.
    #[display("Reference cycle detected among output columns: {}", _0.join(" -> "))]
    ReferenceCycle(Vec<String>),
    /// Request exceeded the maximum rows per add/regen call.
    #[display("Request has {} rows, exceeding the maximum of {}", requested, max)]
    TooManyRows {
        /// Rows requested.
        requested: usize,
        /// Maximum rows allowed per request.
        max: usize,
    },
    /// A schema invariant was violated by a mutating operation.
    #[display("Schema invariant violated: {}", _0)]
    SchemaViolation(String),
    /// Requested resource (table, row, column) does not exist.
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// The request conflicts with existing state.
    #[display("Conflict: {}", _0)]
    Conflict(String),
    /// The request was cancelled by the client disconnecting.
    #[display("Request cancelled")]
    Cancelled,
    /// A fault outside any single cell (e.g. storage write failure) aborted
    /// the whole request.
    #[display("Internal error: {}", _0)]
    Internal(String),
}

/// Engine error with location tracking.
///
/// # Examples
///
/// ```
/// use gentable_error::{EngineError, EngineErrorKind};
///
/// let err = EngineError::new(EngineErrorKind::UnknownColumn("foo".to_string()));
/// assert!(format!("{}", err).contains("Unknown column"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Engine Error: {} at line {} in {}", kind, line, file)]
pub struct EngineError {
    /// The kind of error that occurred.
    pub kind: EngineErrorKind,
    /// Line number where error was created.
    pub line: u32,
    /// File where error was created.
    pub file: &'static str,
}

impl EngineError {
    /// Create a new engine error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: EngineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for constructing a [`EngineErrorKind::NotFound`] error.
    #[track_caller]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::NotFound(what.into()))
    }

    /// Shorthand for constructing a [`EngineErrorKind::Internal`] error.
    #[track_caller]
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Internal(reason.into()))
    }
}
