use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;

/// Core trait for key-value store implementations.
///
/// The operations are the minimum the lock and idempotency guard require
/// from a store shared by independent callers. All read-modify-write
/// operations must be atomic with respect to the store itself.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Retrieves the value stored under `key`.
    ///
    /// Expired entries are treated as absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key` only if the key is currently absent.
    ///
    /// When `ttl` is set, the entry expires after that duration.
    /// Returns true if the value was stored, false if the key was taken.
    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool>;

    /// Atomically replaces the value under `key` with `new` only if the
    /// current value equals `expected`.
    ///
    /// The entry's expiry is replaced by `ttl` on success.
    /// Returns true if the value was replaced.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool>;

    /// Atomically deletes `key` only if its current value equals `expected`.
    ///
    /// Returns true if the entry was deleted.
    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool>;

    /// Atomically increments the integer counter at `key` and returns the
    /// new value.
    ///
    /// A missing counter starts at zero; `ttl` is applied only when the
    /// counter is created by this call.
    async fn increment(&self, key: &str, ttl: Option<Duration>) -> Result<i64>;

    /// Returns the remaining time-to-live for `key`.
    ///
    /// Returns None if the key does not exist or has no expiry.
    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>>;
}

/// Extension trait providing JSON convenience methods for stores.
#[async_trait]
pub trait KvStoreExt: KvStore {
    /// Retrieves and deserializes the JSON value stored under `key`.
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` as JSON and stores it if `key` is absent.
    async fn set_if_absent_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let bytes = serde_json::to_vec(value)?;
        self.set_if_absent(key, &bytes, ttl).await
    }
}

// Blanket implementation for all KvStore implementations
impl<T: KvStore + ?Sized> KvStoreExt for T {}
