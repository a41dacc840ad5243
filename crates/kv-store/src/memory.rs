use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::{
    KvStoreError, Result,
    store::KvStore,
};

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
    }
}

/// In-memory key-value store implementation for testing.
///
/// This implementation keeps all entries in process memory and provides the
/// same interface and atomicity guarantees as the Redis implementation.
/// Expiry is evaluated against `tokio::time`, so tests can drive it with
/// paused time. Counters are stored as decimal strings for parity with
/// Redis `INCR` semantics.
#[derive(Clone, Default)]
pub struct InMemoryKvStore {
    entries: Arc<RwLock<HashMap<String, StoredEntry>>>,
}

impl InMemoryKvStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    /// Returns true if the store holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Clears all entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

fn expiry_for(ttl: Option<Duration>) -> Option<Instant> {
    ttl.map(|ttl| Instant::now() + ttl)
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if let Some(existing) = entries.get(key)
            && existing.is_live(now)
        {
            return Ok(false);
        }

        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_vec(),
                expires_at: expiry_for(ttl),
            },
        );
        Ok(true)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) && entry.value == expected => {
                entry.value = new.to_vec();
                entry.expires_at = expiry_for(ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let matches = entries
            .get(key)
            .is_some_and(|entry| entry.is_live(now) && entry.value == expected);
        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }

    async fn increment(&self, key: &str, ttl: Option<Duration>) -> Result<i64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let current = match entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                let value = std::str::from_utf8(&entry.value)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or_else(|| KvStoreError::InvalidCounter {
                        key: key.to_string(),
                    })?;
                Some(value)
            }
            _ => None,
        };

        match current {
            Some(value) => {
                let next = value + 1;
                if let Some(entry) = entries.get_mut(key) {
                    entry.value = next.to_string().into_bytes();
                }
                Ok(next)
            }
            None => {
                entries.insert(
                    key.to_string(),
                    StoredEntry {
                        value: b"1".to_vec(),
                        expires_at: expiry_for(ttl),
                    },
                );
                Ok(1)
            }
        }
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|expires_at| expires_at - now))
    }
}
