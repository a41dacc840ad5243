//! Circuit breaker for failing fast against unhealthy dependencies.
//!
//! Wraps calls to an operation that may be failing. While the dependency is
//! healthy the breaker stays Closed and passes every call through. Once
//! consecutive failures reach a configured threshold the breaker Opens and
//! rejects calls immediately, without invoking the operation, so callers
//! fail fast and the dependency gets room to recover. After a recovery
//! interval a single trial call is admitted (Half-Open); its outcome decides
//! whether the circuit closes again or re-opens.
//!
//! The breaker's counters are process-local: its job is local
//! call-admission control, not cross-process coordination.

pub mod breaker;
pub mod config;
pub mod error;
pub mod state;

pub use breaker::CircuitBreaker;
pub use config::CircuitBreakerConfig;
pub use error::CircuitBreakerError;
pub use state::CircuitState;
