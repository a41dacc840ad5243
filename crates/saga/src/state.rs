//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a saga in its lifecycle.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Succeeded
///                          └──► Compensating ──┬──► Compensated
///                                              └──► CompensationFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Saga has not started yet.
    #[default]
    NotStarted,

    /// Saga steps are being executed.
    Running,

    /// A step failed and compensating actions are in progress.
    Compensating,

    /// All steps completed successfully (terminal state).
    Succeeded,

    /// A step failed and every compensation succeeded (terminal state).
    Compensated,

    /// A step failed and one or more compensations also failed
    /// (terminal state; requires manual intervention).
    CompensationFailed,
}

impl SagaState {
    /// Returns true if the saga can begin running.
    pub fn can_run(&self) -> bool {
        matches!(self, SagaState::NotStarted)
    }

    /// Returns true if the saga can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaState::Running)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::Succeeded | SagaState::Compensated | SagaState::CompensationFailed
        )
    }

    /// Returns true if the system was left in an inconsistent state that
    /// an operator must repair.
    pub fn requires_intervention(&self) -> bool {
        matches!(self, SagaState::CompensationFailed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "NotStarted",
            SagaState::Running => "Running",
            SagaState::Compensating => "Compensating",
            SagaState::Succeeded => "Succeeded",
            SagaState::Compensated => "Compensated",
            SagaState::CompensationFailed => "CompensationFailed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
