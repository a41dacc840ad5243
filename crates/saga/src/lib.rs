//! Saga coordination for multi-step operations with compensations.
//!
//! A saga runs an ordered list of steps, each pairing a forward action with
//! a compensating action, in place of a single atomic cross-system
//! transaction. If a forward action fails, the actions already completed are
//! undone in strict reverse order. A compensation that itself fails is
//! recorded and does not stop the remaining compensations; the run then ends
//! in a distinct terminal state that signals manual intervention.
//!
//! Every run produces a [`SagaJournal`]: the ordered record of step events
//! and the derived terminal state.

pub mod coordinator;
pub mod error;
pub mod events;
pub mod journal;
pub mod state;
pub mod step;

pub use coordinator::{SagaConfig, SagaCoordinator};
pub use error::{Result, SagaError};
pub use events::SagaEvent;
pub use journal::SagaJournal;
pub use state::SagaState;
pub use step::SagaStep;
