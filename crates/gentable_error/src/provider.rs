//! Model-provider (`LmEngine`/`Embedder`) error types.

use crate::RetryableError;

/// Kinds of model-provider failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Provider rejected the request for rate-limit reasons (HTTP 429).
    #[display("Rate limited (HTTP {}): {}", status_code, message)]
    RateLimited {
        /// HTTP status code, when applicable.
        status_code: u16,
        /// Provider-reported message.
        message: String,
    },
    /// Transient server-side failure (HTTP 5xx, connection reset, timeout).
    #[display("Transient provider failure (HTTP {}): {}", status_code, message)]
    Transient {
        /// HTTP status code, when applicable.
        status_code: u16,
        /// Provider-reported message.
        message: String,
    },
    /// The prompt plus history exceeded the model's context window. Fatal
    /// for the cell — not retried (spec §4.C step 5).
    #[display("Context window exceeded: {}", _0)]
    ContextOverflow(String),
    /// Authentication with the provider failed.
    #[display("Authentication failed: {}", _0)]
    Authentication(String),
    /// The request was malformed in a way the provider rejected outright.
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),
    /// The provider's response could not be parsed.
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),
}

/// Model-provider error with location tracking.
///
/// # Examples
///
/// ```
/// use gentable_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::ContextOverflow("32000 tokens".to_string()));
/// assert!(format!("{}", err).contains("Context window"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred.
    pub kind: ProviderErrorKind,
    /// Line number where error was created.
    pub line: u32,
    /// File where error was created.
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new provider error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::RateLimited { .. } | ProviderErrorKind::Transient { .. }
        )
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match &self.kind {
            ProviderErrorKind::RateLimited { .. } => (2000, 3, 30),
            ProviderErrorKind::Transient { .. } => (500, 3, 8),
            _ => (500, 0, 0),
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
