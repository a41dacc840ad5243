use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when interacting with the key-value store.
#[derive(Debug, Error)]
pub enum KvStoreError {
    /// Could not establish a connection to the backing store in time.
    #[error("Connection to {url} timed out after {timeout:?}")]
    ConnectTimeout { url: String, timeout: Duration },

    /// The backing store returned an error.
    #[error("Store backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// The value stored at a counter key is not an integer.
    #[error("Value at key '{key}' is not an integer counter")]
    InvalidCounter { key: String },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, KvStoreError>;
