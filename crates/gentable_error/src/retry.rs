//! Retry classification shared by every leaf error type.
//!
//! Generalizes a Gemini-specific retry classifier so any provider or
//! cell-level error can opt in to the same retry wrapper (see
//! `gentable_models::retry`).

/// Trait for errors that support retry logic.
///
/// Transient errors (rate limits, transient 5xx) should return `true` from
/// [`is_retryable`](RetryableError::is_retryable); permanent errors
/// (context overflow, bad request, auth failures) should return `false`.
///
/// # Examples
///
/// ```
/// use gentable_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::new(ProviderErrorKind::RateLimited {
///     status_code: 429,
///     message: "too many requests".to_string(),
/// });
/// assert!(err.is_retryable());
/// let (backoff, retries, max_delay) = err.retry_strategy_params();
/// assert_eq!(retries, 3);
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger an internal cell retry.
    fn is_retryable(&self) -> bool;

    /// Retry strategy parameters: `(initial_backoff_ms, max_retries, max_delay_secs)`.
    ///
    /// Per spec §4.C, cell-level retries are capped at three attempts.
    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        (500, 3, 8)
    }
}
