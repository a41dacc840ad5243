//! Lock error types.
//!
//! Contention is not an error: `acquire` returns `None` when the lock is
//! held, and the caller decides whether to retry, queue, or give up.

use std::time::Duration;

use kv_store::KvStoreError;
use thiserror::Error;

/// Errors that can occur during lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// The requested TTL cannot guarantee eventual release.
    #[error("lock TTL must be greater than zero, got {ttl:?}")]
    InvalidTtl { ttl: Duration },

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] KvStoreError),
}

/// Result type for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;
