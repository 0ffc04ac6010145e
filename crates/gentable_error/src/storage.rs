//! Storage-engine backend error types.
//!
//! These cover failures inside the abstract storage engine the execution
//! core consumes (see spec §6) — row persistence, index maintenance, and
//! hybrid search — as distinct from the request-level [`EngineErrorKind::NotFound`]
//! / [`EngineErrorKind::Conflict`](crate::EngineErrorKind) that surface
//! immediately to the client.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// A row write (insert/update/delete) failed at the backend.
    #[display("Row write failed: {}", _0)]
    WriteFailed(String),
    /// A row read failed at the backend.
    #[display("Row read failed: {}", _0)]
    ReadFailed(String),
    /// Requested row id does not exist in the table.
    #[display("Row not found: {}", _0)]
    RowNotFound(String),
    /// Hybrid search (vector + FTS) failed.
    #[display("Hybrid search failed: {}", _0)]
    SearchFailed(String),
    /// Index creation or maintenance failed.
    #[display("Index maintenance failed on column {}: {}", column, reason)]
    IndexFailed {
        /// Column the index maintenance targeted.
        column: String,
        /// Underlying failure reason.
        reason: String,
    },
    /// Storage backend is unavailable.
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
    /// Invalid storage configuration.
    #[display("Invalid storage configuration: {}", _0)]
    InvalidConfig(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use gentable_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::RowNotFound("row_123".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred.
    pub kind: StorageErrorKind,
    /// Line number where error was created.
    pub line: u32,
    /// File where error was created.
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
