//! Failure taxonomy for wrapped operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of an operation failure.
///
/// A retry policy layer uses this to decide whether another attempt can
/// succeed: transient failures are worth retrying, permanent ones are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// The operation may succeed if retried (timeout, unavailable dependency).
    Transient,

    /// No number of retries will make the operation succeed (invalid input).
    Permanent,
}

impl FailureKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transient => "Transient",
            FailureKind::Permanent => "Permanent",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error reported by an operation wrapped by one of the primitives.
///
/// Carries the failure classification alongside the message so the guard,
/// breaker, and saga coordinator can surface it to retry layers unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} failure: {message}")]
pub struct OperationError {
    /// Whether a retry can succeed.
    pub kind: FailureKind,
    /// Human-readable description of the failure.
    pub message: String,
}

impl OperationError {
    /// Creates a transient failure.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    /// Creates a permanent failure.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    /// Returns true if a retry of the failed operation can succeed.
    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_constructor() {
        let err = OperationError::transient("connection reset");
        assert_eq!(err.kind, FailureKind::Transient);
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Transient failure: connection reset");
    }

    #[test]
    fn permanent_constructor() {
        let err = OperationError::permanent("malformed request");
        assert_eq!(err.kind, FailureKind::Permanent);
        assert!(!err.is_transient());
    }

    #[test]
    fn serialization_roundtrip() {
        let err = OperationError::transient("timeout");
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: OperationError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn failure_kind_display() {
        assert_eq!(FailureKind::Transient.to_string(), "Transient");
        assert_eq!(FailureKind::Permanent.to_string(), "Permanent");
    }
}
