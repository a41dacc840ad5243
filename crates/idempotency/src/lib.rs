//! Idempotency guard for retried operations.
//!
//! A client that times out and retries cannot know whether its first attempt
//! took effect. The guard gives a logical operation, identified by a
//! caller-supplied key, an effect equivalent to "exactly once": the first
//! successful execution stores its result in the shared store, and every
//! later call under the same key replays that result instead of re-executing
//! side effects.
//!
//! Failed attempts store nothing and stay retryable. Concurrent calls for
//! the same unset key are resolved by a pending marker: one caller claims
//! the key, the rest fail fast with [`IdempotencyError::InFlight`].

pub mod error;
pub mod guard;
pub mod record;

pub use error::{IdempotencyError, Result};
pub use guard::{Execution, IdempotencyConfig, IdempotencyGuard};
pub use record::IdempotencyRecord;
