//! Idempotency guard error types.

use std::time::Duration;

use common::{IdempotencyKey, OperationError};
use kv_store::KvStoreError;
use thiserror::Error;

/// Errors that can occur during guarded execution.
#[derive(Debug, Error)]
pub enum IdempotencyError {
    /// Another execution currently holds this key. The caller should retry
    /// after the holder finishes or its pending marker expires.
    #[error("operation for key '{key}' is already in flight")]
    InFlight { key: IdempotencyKey },

    /// The wrapped operation failed. Nothing was stored; the key is free
    /// for another attempt.
    #[error("operation failed: {0}")]
    Operation(OperationError),

    /// The wrapped operation exceeded the configured timeout. Nothing was
    /// stored.
    #[error("operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] KvStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IdempotencyError {
    /// Returns true when a later retry of the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            IdempotencyError::InFlight { .. }
            | IdempotencyError::Timeout { .. }
            | IdempotencyError::Store(_) => true,
            IdempotencyError::Operation(e) => e.is_transient(),
            IdempotencyError::Serialization(_) => false,
        }
    }
}

/// Result type for guard operations.
pub type Result<T> = std::result::Result<T, IdempotencyError>;
