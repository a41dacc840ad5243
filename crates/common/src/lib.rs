//! Shared types for the coordination primitives workspace.
//!
//! This crate provides the identifier newtypes used across the workspace
//! (idempotency keys, lock resource keys, owner tokens, saga IDs) and the
//! transient/permanent failure taxonomy wrapped operations report through.

pub mod failure;
pub mod types;

pub use failure::{FailureKind, OperationError};
pub use types::{EmptyKeyError, IdempotencyKey, OwnerToken, ResourceKey, SagaId};
