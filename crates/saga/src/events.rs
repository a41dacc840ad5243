//! Saga events.
//!
//! Every notable moment of a run is recorded as an event in the journal,
//! so the terminal state of a saga can always be explained from its log.

use chrono::{DateTime, Utc};
use common::{FailureKind, SagaId};
use serde::{Deserialize, Serialize};

/// Events that can occur during saga execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// Saga execution started.
    SagaStarted(SagaStartedData),

    /// A saga step started execution.
    StepStarted(StepData),

    /// A saga step completed successfully.
    StepCompleted(StepData),

    /// A saga step failed.
    StepFailed(StepFailedData),

    /// Compensation started after a step failure.
    CompensationStarted(CompensationData),

    /// A compensation step completed successfully.
    CompensationStepCompleted(StepData),

    /// A compensation step failed (recorded, compensation continues).
    CompensationStepFailed(StepFailedData),

    /// All steps completed successfully.
    SagaSucceeded(SagaSucceededData),

    /// A step failed and every compensation succeeded.
    SagaCompensated(SagaCompensatedData),

    /// A step failed and one or more compensations also failed.
    SagaCompensationFailed(SagaCompensationFailedData),
}

impl SagaEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::SagaStarted(_) => "SagaStarted",
            SagaEvent::StepStarted(_) => "StepStarted",
            SagaEvent::StepCompleted(_) => "StepCompleted",
            SagaEvent::StepFailed(_) => "StepFailed",
            SagaEvent::CompensationStarted(_) => "CompensationStarted",
            SagaEvent::CompensationStepCompleted(_) => "CompensationStepCompleted",
            SagaEvent::CompensationStepFailed(_) => "CompensationStepFailed",
            SagaEvent::SagaSucceeded(_) => "SagaSucceeded",
            SagaEvent::SagaCompensated(_) => "SagaCompensated",
            SagaEvent::SagaCompensationFailed(_) => "SagaCompensationFailed",
        }
    }
}

/// Data for SagaStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaStartedData {
    /// The saga run ID.
    pub saga_id: SagaId,
    /// The saga name (e.g., "order_fulfillment").
    pub saga_name: String,
    /// When the saga started.
    pub started_at: DateTime<Utc>,
}

/// Data for step lifecycle events (just the step name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepData {
    /// The step name.
    pub step_name: String,
}

/// Data for StepFailed and CompensationStepFailed events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailedData {
    /// The step that failed.
    pub step_name: String,
    /// Error message describing the failure.
    pub error: String,
    /// Whether a retry of the step could have succeeded.
    pub kind: FailureKind,
}

/// Data for CompensationStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationData {
    /// The step whose failure triggered compensation.
    pub from_step: String,
}

/// Data for SagaSucceeded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaSucceededData {
    /// When the saga succeeded.
    pub succeeded_at: DateTime<Utc>,
}

/// Data for SagaCompensated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaCompensatedData {
    /// When compensation finished.
    pub compensated_at: DateTime<Utc>,
}

/// Data for SagaCompensationFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaCompensationFailedData {
    /// The steps whose compensations failed.
    pub failed_steps: Vec<String>,
    /// When compensation finished.
    pub failed_at: DateTime<Utc>,
}

// Convenience constructors
impl SagaEvent {
    /// Creates a SagaStarted event.
    pub fn saga_started(saga_id: SagaId, saga_name: impl Into<String>) -> Self {
        SagaEvent::SagaStarted(SagaStartedData {
            saga_id,
            saga_name: saga_name.into(),
            started_at: Utc::now(),
        })
    }

    /// Creates a StepStarted event.
    pub fn step_started(step_name: impl Into<String>) -> Self {
        SagaEvent::StepStarted(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a StepCompleted event.
    pub fn step_completed(step_name: impl Into<String>) -> Self {
        SagaEvent::StepCompleted(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a StepFailed event.
    pub fn step_failed(
        step_name: impl Into<String>,
        error: impl Into<String>,
        kind: FailureKind,
    ) -> Self {
        SagaEvent::StepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
            kind,
        })
    }

    /// Creates a CompensationStarted event.
    pub fn compensation_started(from_step: impl Into<String>) -> Self {
        SagaEvent::CompensationStarted(CompensationData {
            from_step: from_step.into(),
        })
    }

    /// Creates a CompensationStepCompleted event.
    pub fn compensation_step_completed(step_name: impl Into<String>) -> Self {
        SagaEvent::CompensationStepCompleted(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a CompensationStepFailed event.
    pub fn compensation_step_failed(
        step_name: impl Into<String>,
        error: impl Into<String>,
        kind: FailureKind,
    ) -> Self {
        SagaEvent::CompensationStepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
            kind,
        })
    }

    /// Creates a SagaSucceeded event.
    pub fn saga_succeeded() -> Self {
        SagaEvent::SagaSucceeded(SagaSucceededData {
            succeeded_at: Utc::now(),
        })
    }

    /// Creates a SagaCompensated event.
    pub fn saga_compensated() -> Self {
        SagaEvent::SagaCompensated(SagaCompensatedData {
            compensated_at: Utc::now(),
        })
    }

    /// Creates a SagaCompensationFailed event.
    pub fn saga_compensation_failed(failed_steps: Vec<String>) -> Self {
        SagaEvent::SagaCompensationFailed(SagaCompensationFailedData {
            failed_steps,
            failed_at: Utc::now(),
        })
    }
}
