//! The lock manager.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{OwnerToken, ResourceKey};
use kv_store::KvStore;

use crate::error::{LockError, Result};

/// A granted lock: proof of ownership of a resource until the TTL elapses
/// or the lease is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    /// The locked resource.
    pub resource: ResourceKey,
    /// Token identifying this acquisition. Required to release or extend.
    pub token: OwnerToken,
    /// The TTL the lease was granted with.
    pub ttl: Duration,
    /// When the lease was granted.
    pub acquired_at: DateTime<Utc>,
}

/// Grants mutually exclusive, TTL-bounded access to named resources through
/// the shared store.
pub struct LockManager<S> {
    store: S,
}

impl<S: KvStore> LockManager<S> {
    /// Creates a lock manager over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn lock_key(resource: &ResourceKey) -> String {
        format!("lock:{}", resource)
    }

    fn token_bytes(token: OwnerToken) -> Vec<u8> {
        token.as_uuid().to_string().into_bytes()
    }

    /// Attempts to acquire the lock on `resource` for `ttl`.
    ///
    /// Returns `None` if another owner currently holds the lock, an
    /// expected outcome rather than an error. The TTL guarantees eventual release
    /// if the holder crashes; choose it well above the expected
    /// critical-section duration.
    #[tracing::instrument(skip_all, fields(resource = %resource))]
    pub async fn acquire(&self, resource: &ResourceKey, ttl: Duration) -> Result<Option<Lease>> {
        if ttl.is_zero() {
            return Err(LockError::InvalidTtl { ttl });
        }

        let token = OwnerToken::new();
        let granted = self
            .store
            .set_if_absent(
                &Self::lock_key(resource),
                &Self::token_bytes(token),
                Some(ttl),
            )
            .await?;

        if granted {
            metrics::counter!("lock_acquisitions_total").increment(1);
            tracing::debug!(%token, ?ttl, "lock acquired");
            Ok(Some(Lease {
                resource: resource.clone(),
                token,
                ttl,
                acquired_at: Utc::now(),
            }))
        } else {
            metrics::counter!("lock_contention_total").increment(1);
            Ok(None)
        }
    }

    /// Releases the lock on `resource` if `token` still matches the stored
    /// owner.
    ///
    /// Returns false when the lock already expired, was reacquired by
    /// another owner, or was never held by this caller. The stored entry is
    /// removed only on a true return (atomic compare-and-delete).
    #[tracing::instrument(skip_all, fields(resource = %resource))]
    pub async fn release(&self, resource: &ResourceKey, token: OwnerToken) -> Result<bool> {
        let released = self
            .store
            .compare_and_delete(&Self::lock_key(resource), &Self::token_bytes(token))
            .await?;

        if released {
            metrics::counter!("lock_releases_total").increment(1);
            tracing::debug!(%token, "lock released");
        } else {
            metrics::counter!("lock_stale_releases_total").increment(1);
            tracing::debug!(%token, "release refused: token no longer owns the lock");
        }
        Ok(released)
    }

    /// Extends the lease on `resource` to a fresh `ttl` if `token` still
    /// matches the stored owner.
    ///
    /// Lets a holder that is still working keep the lock alive without
    /// releasing and racing to reacquire. Returns false when ownership was
    /// already lost.
    pub async fn extend(
        &self,
        resource: &ResourceKey,
        token: OwnerToken,
        ttl: Duration,
    ) -> Result<bool> {
        if ttl.is_zero() {
            return Err(LockError::InvalidTtl { ttl });
        }

        let bytes = Self::token_bytes(token);
        let extended = self
            .store
            .compare_and_swap(&Self::lock_key(resource), &bytes, &bytes, Some(ttl))
            .await?;

        if extended {
            tracing::debug!(%resource, %token, ?ttl, "lease extended");
        }
        Ok(extended)
    }

    /// Returns the remaining time before the lock on `resource` expires.
    ///
    /// Returns `None` when the lock is not held.
    pub async fn ttl_remaining(&self, resource: &ResourceKey) -> Result<Option<Duration>> {
        Ok(self.store.time_to_live(&Self::lock_key(resource)).await?)
    }

    /// Returns true if some owner currently holds the lock on `resource`.
    pub async fn is_held(&self, resource: &ResourceKey) -> Result<bool> {
        Ok(self.store.get(&Self::lock_key(resource)).await?.is_some())
    }
}
