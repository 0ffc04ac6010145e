//! Errors raised while bootstrapping the service process (config load,
//! tracing/observability init, background task startup/shutdown).

/// Error kinds for server bootstrap operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum ServerErrorKind {
    /// Configuration failed to load or validate.
    #[display("Configuration error: {}", _0)]
    Configuration(String),
    /// A global singleton (cache layer, model router pool, usage flusher)
    /// failed to initialize.
    #[display("Failed to initialize {}: {}", component, reason)]
    InitFailed {
        /// Component name.
        component: String,
        /// Failure reason.
        reason: String,
    },
    /// Graceful shutdown did not complete cleanly.
    #[display("Shutdown error: {}", _0)]
    ShutdownFailed(String),
}

/// Error wrapper with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Server Error: {} at line {} in {}", kind, line, file)]
pub struct ServerError {
    /// The error kind.
    pub kind: ServerErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// File where error occurred.
    pub file: &'static str,
}

impl ServerError {
    /// Create a new ServerError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ServerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
