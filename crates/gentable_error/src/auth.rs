//! Authorization and entitlement error types.
//!
//! Per spec §7, these are surfaced immediately: no retry, no usage recorded.

/// Kinds of authorization/entitlement failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum AuthErrorKind {
    /// The caller is not permitted to perform this operation at all.
    #[display("Forbidden: {}", _0)]
    Forbidden(String),
    /// The organization's plan does not include this capability.
    #[display("Upgrade required for {}: {}", category, reason)]
    UpgradeTier {
        /// Billing category that triggered the block (llm, embed, rerank, egress, db, file).
        category: String,
        /// Human-readable reason.
        reason: String,
    },
    /// The organization has exhausted its credit balance for this category.
    #[display("Insufficient credits for {}: {}", category, reason)]
    InsufficientCredits {
        /// Billing category that triggered the block.
        category: String,
        /// Human-readable reason.
        reason: String,
    },
}

/// Authorization error with location tracking.
///
/// # Examples
///
/// ```
/// use gentable_error::{AuthError, AuthErrorKind};
///
/// let err = AuthError::new(AuthErrorKind::Forbidden("no write access".to_string()));
/// assert!(format!("{}", err).contains("Forbidden"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Auth Error: {} at line {} in {}", kind, line, file)]
pub struct AuthError {
    /// The kind of error that occurred.
    pub kind: AuthErrorKind,
    /// Line number where error was created.
    pub line: u32,
    /// File where error was created.
    pub file: &'static str,
}

impl AuthError {
    /// Create a new auth error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AuthErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
