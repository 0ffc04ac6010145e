//! Errors from the cache/lock layer (spec §4.H).

/// Kinds of cache/lock failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CacheErrorKind {
    /// A non-blocking lock acquisition found the lock already held.
    #[display("Lock '{}' is held by another owner", _0)]
    LockHeld(String),
    /// A blocking lock acquisition timed out waiting for release.
    #[display("Timed out waiting for lock '{}'", _0)]
    LockTimeout(String),
    /// The underlying cache backend is unreachable.
    #[display("Cache backend unavailable: {}", _0)]
    Unavailable(String),
    /// A stored value could not be deserialized.
    #[display("Malformed cache entry at key '{}': {}", key, reason)]
    Malformed {
        /// Cache key.
        key: String,
        /// Failure reason.
        reason: String,
    },
}

/// Cache error with location tracking.
///
/// # Examples
///
/// ```
/// use gentable_error::{CacheError, CacheErrorKind};
///
/// let err = CacheError::new(CacheErrorKind::LockHeld("table:42:reindex".to_string()));
/// assert!(format!("{}", err).contains("held"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cache Error: {} at line {} in {}", kind, line, file)]
pub struct CacheError {
    /// The kind of error that occurred.
    pub kind: CacheErrorKind,
    /// Line number where error was created.
    pub line: u32,
    /// File where error was created.
    pub file: &'static str,
}

impl CacheError {
    /// Create a new cache error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CacheErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
