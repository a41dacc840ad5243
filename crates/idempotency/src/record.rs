//! Stored record format for idempotency keys.

use chrono::{DateTime, Utc};
use common::OwnerToken;
use serde::{Deserialize, Serialize};

/// Stored state of one logical operation, keyed by idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum IdempotencyRecord {
    /// An execution currently holds the key and has not finished.
    Pending(PendingData),

    /// A prior execution finished; its result is stored for replay.
    Completed(CompletedData),
}

/// Data for a pending marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingData {
    /// Token identifying the execution that claimed the key.
    pub execution_token: OwnerToken,
    /// When the execution claimed the key.
    pub started_at: DateTime<Utc>,
}

/// Data for a completed record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedData {
    /// The stored operation result.
    pub result: serde_json::Value,
    /// When the operation completed.
    pub completed_at: DateTime<Utc>,
}

// Convenience constructors
impl IdempotencyRecord {
    /// Creates a pending marker for a new execution.
    pub fn pending(execution_token: OwnerToken) -> Self {
        IdempotencyRecord::Pending(PendingData {
            execution_token,
            started_at: Utc::now(),
        })
    }

    /// Creates a completed record holding a result.
    pub fn completed(result: serde_json::Value) -> Self {
        IdempotencyRecord::Completed(CompletedData {
            result,
            completed_at: Utc::now(),
        })
    }

    /// Returns the record kind as a string.
    pub fn record_type(&self) -> &'static str {
        match self {
            IdempotencyRecord::Pending(_) => "Pending",
            IdempotencyRecord::Completed(_) => "Completed",
        }
    }

    /// Serializes the record for storage.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Deserializes a record from stored bytes.
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
