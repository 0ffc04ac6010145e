//! Top-level error wrapper types.

use crate::{
    AuthError, BackendError, BuilderError, CacheError, ConfigError, EngineError, HttpError,
    JsonError, NotImplementedError, ProviderError, SandboxError, ServerError, StorageError,
};
#[cfg(feature = "database")]
use crate::DatabaseError;

/// This is the foundation error enum. Every leaf error type defined in
/// this crate converts into a variant here via `#[from]`.
///
/// # Examples
///
/// ```
/// use gentable_error::{GentableError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: GentableError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum GentableErrorKind {
    /// HTTP transport error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Generic backend error
    #[from(BackendError)]
    Backend(BackendError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Feature not yet implemented
    #[from(NotImplementedError)]
    NotImplemented(NotImplementedError),
    /// Authorization / entitlement error (§7 "forbidden", "upgrade-tier")
    #[from(AuthError)]
    Auth(AuthError),
    /// Execution-engine error (schema validation, cancellation, internal)
    #[from(EngineError)]
    Engine(EngineError),
    /// Storage-engine backend error
    #[from(StorageError)]
    Storage(StorageError),
    /// Model-provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Sandboxed code-generator error
    #[from(SandboxError)]
    Sandbox(SandboxError),
    /// Cache/lock layer error
    #[from(CacheError)]
    Cache(CacheError),
    /// Database persistence error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Server bootstrap error
    #[from(ServerError)]
    Server(ServerError),
}

/// Gentable error with kind discrimination.
///
/// # Examples
///
/// ```
/// use gentable_error::{GentableError, GentableResult, ConfigError};
///
/// fn might_fail() -> GentableResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Gentable Error: {}", _0)]
pub struct GentableError(Box<GentableErrorKind>);

impl GentableError {
    /// Create a new error from a kind.
    pub fn new(kind: GentableErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GentableErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to GentableErrorKind.
impl<T> From<T> for GentableError
where
    T: Into<GentableErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for gentable operations.
///
/// # Examples
///
/// ```
/// use gentable_error::{GentableResult, HttpError};
///
/// fn fetch_data() -> GentableResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type GentableResult<T> = std::result::Result<T, GentableError>;
