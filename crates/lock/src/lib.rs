//! Distributed lock over a shared key-value store.
//!
//! Grants mutually exclusive access to a named resource across independent
//! callers that cannot coordinate in-process. Ownership is token-based: each
//! acquisition mints a unique owner token, and release only succeeds when
//! the caller's token still matches the stored owner, so a slow holder cannot
//! release a lock that expired and was reacquired by someone else.
//!
//! Every lease carries a TTL so the lock is eventually released even if its
//! holder crashes. This trades safety for liveness: a holder that overruns
//! its TTL can be preempted mid-critical-section, so callers must choose a
//! TTL well above the expected critical-section duration.

pub mod error;
pub mod manager;

pub use error::{LockError, Result};
pub use manager::{Lease, LockManager};
