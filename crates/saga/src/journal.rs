//! Saga journal.

use common::SagaId;
use serde::{Deserialize, Serialize};

use crate::events::SagaEvent;
use crate::state::SagaState;

/// The ordered record of one saga run.
///
/// The journal holds every event the run emitted, in order, and derives the
/// current state, the completed steps, and the compensation outcome from
/// them. A run that ends in [`SagaState::CompensationFailed`] names the
/// steps whose compensations failed so an operator can repair them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SagaJournal {
    id: Option<SagaId>,
    saga_name: String,
    state: SagaState,
    current_step: usize,
    completed_steps: Vec<String>,
    compensated_steps: Vec<String>,
    failed_compensations: Vec<String>,
    failure_reason: Option<String>,
    events: Vec<SagaEvent>,
}

impl SagaJournal {
    /// Applies an event, updating the derived state and appending the event
    /// to the log.
    pub fn apply(&mut self, event: SagaEvent) {
        match &event {
            SagaEvent::SagaStarted(data) => {
                self.id = Some(data.saga_id);
                self.saga_name = data.saga_name.clone();
                self.state = SagaState::Running;
            }
            SagaEvent::StepStarted(_) => {
                self.current_step += 1;
            }
            SagaEvent::StepCompleted(data) => {
                self.completed_steps.push(data.step_name.clone());
            }
            SagaEvent::StepFailed(data) => {
                self.failure_reason = Some(data.error.clone());
            }
            SagaEvent::CompensationStarted(_) => {
                self.state = SagaState::Compensating;
            }
            SagaEvent::CompensationStepCompleted(data) => {
                self.compensated_steps.push(data.step_name.clone());
            }
            SagaEvent::CompensationStepFailed(data) => {
                self.failed_compensations.push(data.step_name.clone());
            }
            SagaEvent::SagaSucceeded(_) => {
                self.state = SagaState::Succeeded;
            }
            SagaEvent::SagaCompensated(_) => {
                self.state = SagaState::Compensated;
            }
            SagaEvent::SagaCompensationFailed(_) => {
                self.state = SagaState::CompensationFailed;
            }
        }
        self.events.push(event);
    }

    /// Returns the saga run ID.
    pub fn id(&self) -> Option<SagaId> {
        self.id
    }

    /// Returns the saga name.
    pub fn saga_name(&self) -> &str {
        &self.saga_name
    }

    /// Returns the saga state.
    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Returns the names of steps whose actions completed, in order.
    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    /// Returns the names of steps whose compensations completed, in the
    /// order they were compensated (reverse of completion order).
    pub fn compensated_steps(&self) -> &[String] {
        &self.compensated_steps
    }

    /// Returns the names of steps whose compensations failed.
    pub fn failed_compensations(&self) -> &[String] {
        &self.failed_compensations
    }

    /// Returns the original step failure that triggered compensation.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the full ordered event log.
    pub fn events(&self) -> &[SagaEvent] {
        &self.events
    }

    /// Returns true if the run left the system in a state an operator must
    /// repair.
    pub fn requires_intervention(&self) -> bool {
        self.state.requires_intervention()
    }
}

#[cfg(test)]
mod tests {
    use common::FailureKind;

    use super::*;

    #[test]
    fn test_default_journal() {
        let journal = SagaJournal::default();
        assert!(journal.id().is_none());
        assert_eq!(journal.state(), SagaState::NotStarted);
        assert!(journal.completed_steps().is_empty());
        assert!(journal.events().is_empty());
    }

    #[test]
    fn test_apply_saga_started() {
        let mut journal = SagaJournal::default();
        let saga_id = SagaId::new();

        journal.apply(SagaEvent::saga_started(saga_id, "order_fulfillment"));

        assert_eq!(journal.id(), Some(saga_id));
        assert_eq!(journal.saga_name(), "order_fulfillment");
        assert_eq!(journal.state(), SagaState::Running);
        assert_eq!(journal.events().len(), 1);
    }

    #[test]
    fn test_apply_successful_run() {
        let mut journal = SagaJournal::default();
        journal.apply(SagaEvent::saga_started(SagaId::new(), "order_fulfillment"));

        for step in ["reserve_inventory", "process_payment", "create_shipment"] {
            journal.apply(SagaEvent::step_started(step));
            journal.apply(SagaEvent::step_completed(step));
        }
        journal.apply(SagaEvent::saga_succeeded());

        assert_eq!(journal.state(), SagaState::Succeeded);
        assert_eq!(
            journal.completed_steps(),
            &["reserve_inventory", "process_payment", "create_shipment"]
        );
        assert!(journal.compensated_steps().is_empty());
        assert!(!journal.requires_intervention());
    }

    #[test]
    fn test_apply_failure_and_compensation() {
        let mut journal = SagaJournal::default();
        journal.apply(SagaEvent::saga_started(SagaId::new(), "order_fulfillment"));

        journal.apply(SagaEvent::step_started("reserve_inventory"));
        journal.apply(SagaEvent::step_completed("reserve_inventory"));
        journal.apply(SagaEvent::step_started("process_payment"));
        journal.apply(SagaEvent::step_failed(
            "process_payment",
            "insufficient funds",
            FailureKind::Permanent,
        ));
        assert_eq!(journal.failure_reason(), Some("insufficient funds"));

        journal.apply(SagaEvent::compensation_started("process_payment"));
        assert_eq!(journal.state(), SagaState::Compensating);

        journal.apply(SagaEvent::compensation_step_completed("reserve_inventory"));
        journal.apply(SagaEvent::saga_compensated());

        assert_eq!(journal.state(), SagaState::Compensated);
        assert_eq!(journal.compensated_steps(), &["reserve_inventory"]);
        assert!(!journal.requires_intervention());
    }

    #[test]
    fn test_compensation_step_failure_does_not_change_state() {
        let mut journal = SagaJournal::default();
        journal.apply(SagaEvent::saga_started(SagaId::new(), "order_fulfillment"));
        journal.apply(SagaEvent::step_started("reserve_inventory"));
        journal.apply(SagaEvent::step_completed("reserve_inventory"));
        journal.apply(SagaEvent::step_started("process_payment"));
        journal.apply(SagaEvent::step_failed(
            "process_payment",
            "declined",
            FailureKind::Permanent,
        ));
        journal.apply(SagaEvent::compensation_started("process_payment"));

        journal.apply(SagaEvent::compensation_step_failed(
            "reserve_inventory",
            "service unavailable",
            FailureKind::Transient,
        ));

        // Still compensating; the failure is recorded, not terminal yet
        assert_eq!(journal.state(), SagaState::Compensating);
        assert_eq!(journal.failed_compensations(), &["reserve_inventory"]);

        journal.apply(SagaEvent::saga_compensation_failed(vec![
            "reserve_inventory".to_string(),
        ]));
        assert_eq!(journal.state(), SagaState::CompensationFailed);
        assert!(journal.requires_intervention());
    }

    #[test]
    fn test_serialization() {
        let mut journal = SagaJournal::default();
        let saga_id = SagaId::new();
        journal.apply(SagaEvent::saga_started(saga_id, "order_fulfillment"));
        journal.apply(SagaEvent::step_started("reserve_inventory"));
        journal.apply(SagaEvent::step_completed("reserve_inventory"));

        let json = serde_json::to_string(&journal).unwrap();
        let deserialized: SagaJournal = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.id(), Some(saga_id));
        assert_eq!(deserialized.state(), SagaState::Running);
        assert_eq!(deserialized.completed_steps(), &["reserve_inventory"]);
        assert_eq!(deserialized.events().len(), 3);
    }
}
