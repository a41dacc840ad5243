//! Key-value store abstraction shared by the coordination primitives.
//!
//! The idempotency guard and the distributed lock coordinate independent
//! callers through a store they can all reach. This crate defines the small
//! set of atomic operations they require ([`KvStore`]) and provides two
//! implementations:
//!
//! - [`InMemoryKvStore`] for tests and single-process use
//! - [`RedisKvStore`] for cross-process coordination
//!
//! Every read-modify-write operation (`set_if_absent`, `compare_and_swap`,
//! `compare_and_delete`, `increment`) is atomic with respect to the backing
//! store; a single-process mutex is never assumed to suffice.

pub mod error;
pub mod memory;
pub mod redis;
pub mod store;

pub use error::{KvStoreError, Result};
pub use memory::InMemoryKvStore;
pub use store::{KvStore, KvStoreExt};

pub use crate::redis::RedisKvStore;
