//! Saga error types.
//!
//! A step failure is not an error at this level: the coordinator
//! compensates and reports it through the journal's terminal state.

use thiserror::Error;

/// Errors that can occur when starting a saga run.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A saga needs at least one step.
    #[error("saga '{name}' has no steps")]
    Empty { name: String },
}

/// Result type for saga operations.
pub type Result<T> = std::result::Result<T, SagaError>;
