//! Saga coordinator.

use std::future::Future;
use std::time::Duration;

use common::{OperationError, SagaId};
use tokio::time::timeout;

use crate::error::SagaError;
use crate::events::SagaEvent;
use crate::journal::SagaJournal;
use crate::step::SagaStep;

/// Configuration for a saga coordinator.
#[derive(Debug, Clone, Default)]
pub struct SagaConfig {
    /// Upper bound on each action and each compensation. An elapsed action
    /// is a step failure; an elapsed compensation is a compensation
    /// failure. None leaves steps unbounded.
    pub step_timeout: Option<Duration>,
}

/// Orchestrates saga runs: actions in order, compensations in reverse.
///
/// The coordinator executes each step's forward action in order. On the
/// first action failure it invokes the compensations of all already
/// completed steps in strict reverse order, then returns the journal with
/// the original failure recorded. A compensation that itself fails is
/// journaled and does not halt the remaining compensations; the run then
/// ends in [`crate::SagaState::CompensationFailed`], which callers must
/// surface for manual intervention.
#[derive(Debug, Clone, Default)]
pub struct SagaCoordinator {
    config: SagaConfig,
}

impl SagaCoordinator {
    /// Creates a coordinator with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a coordinator with an explicit configuration.
    pub fn with_config(config: SagaConfig) -> Self {
        Self { config }
    }

    /// Runs the saga `name` over `steps` with the given context.
    ///
    /// Returns the completed journal; its state distinguishes
    /// `Succeeded`, `Compensated`, and `CompensationFailed`. `Err` is
    /// reserved for structural misuse (an empty step list).
    #[tracing::instrument(skip_all, fields(saga_name = name))]
    pub async fn run<C: Send>(
        &self,
        name: &str,
        steps: &[Box<dyn SagaStep<C>>],
        ctx: &mut C,
    ) -> Result<SagaJournal, SagaError> {
        if steps.is_empty() {
            return Err(SagaError::Empty {
                name: name.to_string(),
            });
        }

        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let mut journal = SagaJournal::default();
        journal.apply(SagaEvent::saga_started(SagaId::new(), name));

        for (index, step) in steps.iter().enumerate() {
            tracing::info!(step = step.name(), "saga step started");
            journal.apply(SagaEvent::step_started(step.name()));

            match self.bounded(step.execute(ctx)).await {
                Ok(()) => {
                    journal.apply(SagaEvent::step_completed(step.name()));
                }
                Err(error) => {
                    tracing::warn!(step = step.name(), %error, "saga step failed");
                    journal.apply(SagaEvent::step_failed(
                        step.name(),
                        error.message,
                        error.kind,
                    ));

                    self.compensate(&mut journal, steps, index, ctx).await;
                    metrics::histogram!("saga_duration_seconds")
                        .record(saga_start.elapsed().as_secs_f64());
                    return Ok(journal);
                }
            }
        }

        journal.apply(SagaEvent::saga_succeeded());

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_succeeded_total").increment(1);
        tracing::info!(duration, "saga succeeded");

        Ok(journal)
    }

    /// Runs compensations for completed steps in reverse completion order.
    #[tracing::instrument(skip_all)]
    async fn compensate<C: Send>(
        &self,
        journal: &mut SagaJournal,
        steps: &[Box<dyn SagaStep<C>>],
        failed_index: usize,
        ctx: &mut C,
    ) {
        journal.apply(SagaEvent::compensation_started(steps[failed_index].name()));

        // The failed step's own action never completed, so compensation
        // covers only the steps before it, newest first
        for step in steps[..failed_index].iter().rev() {
            match self.bounded(step.compensate(ctx)).await {
                Ok(()) => {
                    journal.apply(SagaEvent::compensation_step_completed(step.name()));
                }
                Err(error) => {
                    tracing::error!(step = step.name(), %error, "compensation step failed");
                    metrics::counter!("saga_compensation_failures_total").increment(1);
                    journal.apply(SagaEvent::compensation_step_failed(
                        step.name(),
                        error.message,
                        error.kind,
                    ));
                }
            }
        }

        if journal.failed_compensations().is_empty() {
            journal.apply(SagaEvent::saga_compensated());
            metrics::counter!("saga_compensated_total").increment(1);
            tracing::warn!(
                reason = journal.failure_reason().unwrap_or("unknown"),
                "saga compensated after step failure"
            );
        } else {
            let failed_steps = journal.failed_compensations().to_vec();
            journal.apply(SagaEvent::saga_compensation_failed(failed_steps));
            metrics::counter!("saga_compensation_failed_total").increment(1);
            tracing::error!(
                reason = journal.failure_reason().unwrap_or("unknown"),
                "saga left partially compensated, manual intervention required"
            );
        }
    }

    async fn bounded(
        &self,
        operation: impl Future<Output = Result<(), OperationError>>,
    ) -> Result<(), OperationError> {
        match self.config.step_timeout {
            Some(bound) => match timeout(bound, operation).await {
                Ok(result) => result,
                Err(_) => Err(OperationError::transient(format!(
                    "step timed out after {bound:?}"
                ))),
            },
            None => operation.await,
        }
    }
}
