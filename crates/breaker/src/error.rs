//! Circuit breaker error types.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by a guarded call.
///
/// `E` is the error type of the wrapped operation.
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; the call was rejected without invoking the
    /// operation. `retry_after` hints when the next trial call will be
    /// admitted; it is zero while a trial is already in flight, since only
    /// the trial's resolution gates the next call.
    #[error("circuit is open, retry after {retry_after:?}")]
    Open { retry_after: Duration },

    /// The call exceeded the configured timeout and was recorded as a
    /// failure.
    #[error("call timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The operation itself failed; the failure was recorded.
    #[error("operation failed: {0}")]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    /// Returns true if the call was rejected without executing.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CircuitBreakerError::Open { .. })
    }

    /// Returns the retry hint for a rejected call.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CircuitBreakerError::Open { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Returns the wrapped operation error, if the operation ran and failed.
    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(e) => Some(e),
            _ => None,
        }
    }
}
