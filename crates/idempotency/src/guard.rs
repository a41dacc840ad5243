//! The idempotency guard.

use std::future::Future;
use std::time::Duration;

use common::{IdempotencyKey, OperationError, OwnerToken};
use kv_store::KvStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;

use crate::error::{IdempotencyError, Result};
use crate::record::IdempotencyRecord;

/// Configuration for an idempotency guard.
#[derive(Debug, Clone)]
pub struct IdempotencyConfig {
    /// TTL on the pending marker. Bounds how long a crashed execution can
    /// hold a key before it becomes retryable again.
    pub pending_ttl: Duration,

    /// TTL on stored results. None keeps results until the store evicts them.
    pub result_ttl: Option<Duration>,

    /// Upper bound on a single operation invocation.
    pub operation_timeout: Duration,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::from_secs(30),
            result_ttl: Some(Duration::from_secs(24 * 60 * 60)),
            operation_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of a guarded execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution<T> {
    /// The operation ran during this call.
    Fresh(T),

    /// A stored result from a previous call was returned; the operation
    /// was not invoked.
    Replayed(T),
}

impl<T> Execution<T> {
    /// Returns a reference to the result value.
    pub fn value(&self) -> &T {
        match self {
            Execution::Fresh(value) | Execution::Replayed(value) => value,
        }
    }

    /// Consumes the execution and returns the result value.
    pub fn into_value(self) -> T {
        match self {
            Execution::Fresh(value) | Execution::Replayed(value) => value,
        }
    }

    /// Returns true if the result came from the store rather than a fresh run.
    pub fn is_replayed(&self) -> bool {
        matches!(self, Execution::Replayed(_))
    }
}

/// Guards a logical operation so retries have at-most-once effects.
///
/// The guard coordinates through the shared store: a pending marker claims
/// the key while an execution is in flight, and a completed record replays
/// the stored result to every later call under the same key.
pub struct IdempotencyGuard<S> {
    store: S,
    config: IdempotencyConfig,
}

impl<S: KvStore> IdempotencyGuard<S> {
    /// Creates a guard with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, IdempotencyConfig::default())
    }

    /// Creates a guard with an explicit configuration.
    pub fn with_config(store: S, config: IdempotencyConfig) -> Self {
        Self { store, config }
    }

    fn record_key(key: &IdempotencyKey) -> String {
        format!("idempotency:record:{}", key)
    }

    fn attempts_key(key: &IdempotencyKey) -> String {
        format!("idempotency:attempts:{}", key)
    }

    /// Executes `operation` under `key` with at-most-once effects.
    ///
    /// If a prior successful result is stored under the key, it is returned
    /// as [`Execution::Replayed`] without invoking the operation. Otherwise
    /// the operation runs, bounded by the configured timeout; on success the
    /// result is stored before returning [`Execution::Fresh`], on failure
    /// nothing is stored and the key stays retryable.
    ///
    /// A concurrent call for the same unset key fails fast with
    /// [`IdempotencyError::InFlight`] while the first caller's execution is
    /// pending.
    #[tracing::instrument(skip_all, fields(key = %key))]
    pub async fn execute<T, F, Fut>(
        &self,
        key: &IdempotencyKey,
        operation: F,
    ) -> Result<Execution<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, OperationError>>,
    {
        metrics::counter!("idempotency_executions_total").increment(1);

        let attempts = self
            .store
            .increment(&Self::attempts_key(key), self.config.result_ttl)
            .await?;
        tracing::debug!(attempts, "guarded execution requested");

        // Fast path: a stored result replays without running the operation
        if let Some(record) = self.load_record(key).await? {
            return self.resolve_existing(key, record);
        }

        // Claim the key for this execution
        let token = OwnerToken::new();
        let pending_bytes = IdempotencyRecord::pending(token).to_bytes()?;
        let claimed = self
            .store
            .set_if_absent(
                &Self::record_key(key),
                &pending_bytes,
                Some(self.config.pending_ttl),
            )
            .await?;

        if !claimed {
            // Lost the race: the winner either finished already or is in flight
            match self.load_record(key).await? {
                Some(record) => return self.resolve_existing(key, record),
                None => {
                    metrics::counter!("idempotency_conflicts_total").increment(1);
                    return Err(IdempotencyError::InFlight { key: key.clone() });
                }
            }
        }

        match timeout(self.config.operation_timeout, operation()).await {
            Ok(Ok(value)) => {
                let completed =
                    IdempotencyRecord::completed(serde_json::to_value(&value)?).to_bytes()?;
                let finalized = self
                    .store
                    .compare_and_swap(
                        &Self::record_key(key),
                        &pending_bytes,
                        &completed,
                        self.config.result_ttl,
                    )
                    .await?;

                if !finalized {
                    // The marker expired mid-flight; the result stands, but a
                    // concurrent retry may have re-executed.
                    metrics::counter!("idempotency_finalize_lost_total").increment(1);
                    tracing::warn!(%key, "pending marker lost before result could be stored");
                }

                Ok(Execution::Fresh(value))
            }
            Ok(Err(op_err)) => {
                // Failed attempts store nothing and stay retryable
                self.store
                    .compare_and_delete(&Self::record_key(key), &pending_bytes)
                    .await?;
                tracing::debug!(kind = %op_err.kind, "guarded operation failed");
                Err(IdempotencyError::Operation(op_err))
            }
            Err(_) => {
                self.store
                    .compare_and_delete(&Self::record_key(key), &pending_bytes)
                    .await?;
                Err(IdempotencyError::Timeout {
                    timeout: self.config.operation_timeout,
                })
            }
        }
    }

    /// Returns the stored result for `key`, if a completed record exists.
    pub async fn stored_result<T: DeserializeOwned>(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<T>> {
        match self.load_record(key).await? {
            Some(IdempotencyRecord::Completed(data)) => {
                Ok(Some(serde_json::from_value(data.result)?))
            }
            _ => Ok(None),
        }
    }

    /// Returns how many times `execute` has been called for `key`.
    ///
    /// Returns 0 if no attempt has been recorded (or the counter expired).
    pub async fn attempts(&self, key: &IdempotencyKey) -> Result<i64> {
        let count = self
            .store
            .get(&Self::attempts_key(key))
            .await?
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        Ok(count)
    }

    async fn load_record(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>> {
        match self.store.get(&Self::record_key(key)).await? {
            Some(bytes) => Ok(Some(IdempotencyRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn resolve_existing<T: DeserializeOwned>(
        &self,
        key: &IdempotencyKey,
        record: IdempotencyRecord,
    ) -> Result<Execution<T>> {
        match record {
            IdempotencyRecord::Completed(data) => {
                metrics::counter!("idempotency_replays_total").increment(1);
                tracing::debug!(%key, "replaying stored result");
                Ok(Execution::Replayed(serde_json::from_value(data.result)?))
            }
            IdempotencyRecord::Pending(_) => {
                metrics::counter!("idempotency_conflicts_total").increment(1);
                Err(IdempotencyError::InFlight { key: key.clone() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use kv_store::InMemoryKvStore;

    use super::*;

    fn key(s: &str) -> IdempotencyKey {
        IdempotencyKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn executes_operation_once() {
        let guard = IdempotencyGuard::new(InMemoryKvStore::new());
        let key = key("order-1/submit");
        let invocations = Arc::new(AtomicU32::new(0));

        for expected_replay in [false, true] {
            let invocations = invocations.clone();
            let execution = guard
                .execute(&key, || async move {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, OperationError>("confirmed".to_string())
                })
                .await
                .unwrap();

            assert_eq!(execution.value(), "confirmed");
            assert_eq!(execution.is_replayed(), expected_replay);
        }

        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert_eq!(guard.attempts(&key).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn failed_attempt_stores_nothing() {
        let guard = IdempotencyGuard::new(InMemoryKvStore::new());
        let key = key("order-2/submit");

        let result = guard
            .execute(&key, || async {
                Err::<String, _>(OperationError::transient("payment gateway down"))
            })
            .await;

        match result {
            Err(IdempotencyError::Operation(e)) => assert!(e.is_transient()),
            other => panic!("expected operation error, got {other:?}"),
        }
        assert!(
            guard
                .stored_result::<String>(&key)
                .await
                .unwrap()
                .is_none()
        );

        // The key is free for a retry, which succeeds and is stored
        let execution = guard
            .execute(&key, || async {
                Ok::<_, OperationError>("confirmed".to_string())
            })
            .await
            .unwrap();
        assert!(!execution.is_replayed());
        assert_eq!(
            guard.stored_result::<String>(&key).await.unwrap(),
            Some("confirmed".to_string())
        );
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retryable() {
        let guard = IdempotencyGuard::new(InMemoryKvStore::new());

        let result = guard
            .execute(&key("order-3/submit"), || async {
                Err::<String, _>(OperationError::permanent("invalid currency"))
            })
            .await;

        assert!(!result.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn concurrent_call_fails_fast() {
        let guard = Arc::new(IdempotencyGuard::new(InMemoryKvStore::new()));
        let key = key("order-4/submit");

        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel();

        let first = tokio::spawn({
            let guard = guard.clone();
            let key = key.clone();
            async move {
                guard
                    .execute(&key, || async move {
                        started_tx.send(()).ok();
                        release_rx.await.ok();
                        Ok::<_, OperationError>(1u32)
                    })
                    .await
            }
        });

        // Wait until the first call has claimed the key and is running
        started_rx.await.unwrap();

        let second = guard
            .execute(&key, || async { Ok::<_, OperationError>(2u32) })
            .await;
        assert!(matches!(second, Err(IdempotencyError::InFlight { .. })));

        release_tx.send(()).unwrap();
        let first = first.await.unwrap().unwrap();
        assert_eq!(*first.value(), 1);

        // After the first finishes, the same key replays its result
        let third = guard
            .execute(&key, || async { Ok::<_, OperationError>(3u32) })
            .await
            .unwrap();
        assert!(third.is_replayed());
        assert_eq!(*third.value(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_pending_marker_expires() {
        let store = InMemoryKvStore::new();
        let guard = IdempotencyGuard::new(store.clone());
        let key = key("order-5/submit");

        // Simulate an execution that claimed the key and crashed
        let stale = IdempotencyRecord::pending(OwnerToken::new())
            .to_bytes()
            .unwrap();
        store
            .set_if_absent(
                &IdempotencyGuard::<InMemoryKvStore>::record_key(&key),
                &stale,
                Some(guard.config.pending_ttl),
            )
            .await
            .unwrap();

        let blocked = guard
            .execute(&key, || async { Ok::<_, OperationError>(1u32) })
            .await;
        assert!(matches!(blocked, Err(IdempotencyError::InFlight { .. })));

        tokio::time::advance(guard.config.pending_ttl + Duration::from_secs(1)).await;

        let execution = guard
            .execute(&key, || async { Ok::<_, OperationError>(1u32) })
            .await
            .unwrap();
        assert!(!execution.is_replayed());
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_operation_stores_nothing() {
        let config = IdempotencyConfig {
            operation_timeout: Duration::from_secs(1),
            ..IdempotencyConfig::default()
        };
        let guard = IdempotencyGuard::with_config(InMemoryKvStore::new(), config);
        let key = key("order-6/submit");

        let result = guard
            .execute(&key, || std::future::pending::<std::result::Result<u32, OperationError>>())
            .await;
        assert!(matches!(result, Err(IdempotencyError::Timeout { .. })));
        assert!(result.unwrap_err().is_retryable());

        // The key is immediately free again
        let execution = guard
            .execute(&key, || async { Ok::<_, OperationError>(7u32) })
            .await
            .unwrap();
        assert_eq!(*execution.value(), 7);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let guard = IdempotencyGuard::new(InMemoryKvStore::new());

        let a = guard
            .execute(&key("a"), || async { Ok::<_, OperationError>(1u32) })
            .await
            .unwrap();
        let b = guard
            .execute(&key("b"), || async { Ok::<_, OperationError>(2u32) })
            .await
            .unwrap();

        assert_eq!(*a.value(), 1);
        assert_eq!(*b.value(), 2);
        assert!(!b.is_replayed());
    }

    #[tokio::test]
    async fn typed_results_roundtrip() {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Receipt {
            order_id: u64,
            total_cents: i64,
        }

        let guard = IdempotencyGuard::new(InMemoryKvStore::new());
        let key = key("order-7/submit");
        let receipt = Receipt {
            order_id: 7,
            total_cents: 3500,
        };

        let first = guard
            .execute(&key, {
                let receipt = receipt.clone();
                move || async move { Ok::<_, OperationError>(receipt) }
            })
            .await
            .unwrap();
        assert_eq!(first.into_value(), receipt);

        let replayed = guard
            .execute(&key, || async {
                Err::<Receipt, _>(OperationError::permanent("must not run"))
            })
            .await
            .unwrap();
        assert!(replayed.is_replayed());
        assert_eq!(replayed.into_value(), receipt);
    }
}
