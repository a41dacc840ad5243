use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when constructing a key from an empty or blank string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("key must not be empty")]
pub struct EmptyKeyError;

/// Caller-supplied key identifying one logical operation attempt-group.
///
/// Two invocations carrying the same key are treated as retries of the same
/// logical operation. Keys must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Creates a key, rejecting empty or whitespace-only input.
    pub fn new(key: impl Into<String>) -> Result<Self, EmptyKeyError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(EmptyKeyError);
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for IdempotencyKey {
    type Error = EmptyKeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Name of a resource guarded by a distributed lock.
///
/// All callers coordinating on the same resource must use the same key.
/// Keys must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Creates a resource key, rejecting empty or whitespace-only input.
    pub fn new(key: impl Into<String>) -> Result<Self, EmptyKeyError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(EmptyKeyError);
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ResourceKey {
    type Error = EmptyKeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Opaque token identifying a single acquisition or execution.
///
/// A fresh token is minted for every lock acquisition and every in-flight
/// idempotent execution, so a stale holder can never release or finalize
/// state it no longer owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerToken(Uuid);

impl OwnerToken {
    /// Creates a new random owner token.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an owner token from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OwnerToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OwnerToken {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<OwnerToken> for Uuid {
    fn from(token: OwnerToken) -> Self {
        token.0
    }
}

/// Unique identifier for a saga run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SagaId(Uuid);

impl SagaId {
    /// Creates a new random saga ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a saga ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SagaId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SagaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SagaId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<SagaId> for Uuid {
    fn from(id: SagaId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_key_rejects_empty() {
        assert_eq!(IdempotencyKey::new(""), Err(EmptyKeyError));
        assert_eq!(IdempotencyKey::new("   "), Err(EmptyKeyError));
    }

    #[test]
    fn idempotency_key_preserves_value() {
        let key = IdempotencyKey::new("order-42/submit").unwrap();
        assert_eq!(key.as_str(), "order-42/submit");
        assert_eq!(key.to_string(), "order-42/submit");
    }

    #[test]
    fn resource_key_rejects_empty() {
        assert_eq!(ResourceKey::new(""), Err(EmptyKeyError));
    }

    #[test]
    fn owner_token_new_creates_unique_tokens() {
        let t1 = OwnerToken::new();
        let t2 = OwnerToken::new();
        assert_ne!(t1, t2);
    }

    #[test]
    fn owner_token_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let token = OwnerToken::from_uuid(uuid);
        assert_eq!(token.as_uuid(), uuid);
    }

    #[test]
    fn owner_token_serialization_roundtrip() {
        let token = OwnerToken::new();
        let json = serde_json::to_string(&token).unwrap();
        let deserialized: OwnerToken = serde_json::from_str(&json).unwrap();
        assert_eq!(token, deserialized);
    }

    #[test]
    fn saga_id_new_creates_unique_ids() {
        let id1 = SagaId::new();
        let id2 = SagaId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn saga_id_serialization_roundtrip() {
        let id = SagaId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: SagaId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
