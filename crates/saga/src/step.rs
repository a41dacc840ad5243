//! Saga step trait.

use async_trait::async_trait;
use common::OperationError;

/// One saga step: a forward action paired with the compensating action that
/// semantically undoes it.
///
/// `C` is the caller-supplied context the steps of a saga communicate
/// through: a typed record accumulating whatever the steps produce
/// (reservation IDs, payment references) for later steps and compensations
/// to use. Steps run sequentially, so each gets exclusive access.
#[async_trait]
pub trait SagaStep<C: Send>: Send + Sync {
    /// Stable name identifying the step in journals and logs.
    fn name(&self) -> &str;

    /// Executes the forward action.
    async fn execute(&self, ctx: &mut C) -> Result<(), OperationError>;

    /// Undoes a previously completed forward action.
    ///
    /// Only invoked after `execute` completed successfully; a step whose
    /// action never completed is never compensated.
    async fn compensate(&self, ctx: &mut C) -> Result<(), OperationError>;
}
