//! The circuit breaker.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, timeout};

use crate::config::CircuitBreakerConfig;
use crate::error::CircuitBreakerError;
use crate::state::CircuitState;

#[derive(Debug)]
struct Core {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

impl Core {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
        }
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.trial_in_flight = false;
        metrics::counter!("circuit_breaker_opened_total").increment(1);
    }
}

struct Shared {
    config: CircuitBreakerConfig,
    core: Mutex<Core>,
}

/// Call-admission guard around a failing dependency.
///
/// Cloning is cheap and all clones share the same state, so one breaker can
/// guard a dependency across tasks.
#[derive(Clone)]
pub struct CircuitBreaker {
    shared: Arc<Shared>,
}

impl CircuitBreaker {
    /// Creates a breaker with the given configuration.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                core: Mutex::new(Core::new()),
            }),
        }
    }

    /// Creates a breaker with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }

    /// Returns the current state.
    ///
    /// State transitions happen on calls, so a breaker whose recovery
    /// interval has elapsed still reports Open until the next call admits
    /// the trial.
    pub fn state(&self) -> CircuitState {
        self.shared.core.lock().unwrap().state
    }

    /// Returns the current consecutive-failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.shared.core.lock().unwrap().consecutive_failures
    }

    /// Runs `operation` through the breaker.
    ///
    /// In the Open state, before the recovery interval elapses, the call is
    /// rejected immediately with [`CircuitBreakerError::Open`] and the
    /// operation is never invoked. Otherwise the operation runs (bounded by
    /// the configured call timeout, if any), its outcome is recorded, and
    /// its result is returned. A call future dropped before resolving is
    /// recorded as a failure.
    pub async fn execute<T, E, F, Fut>(
        &self,
        operation: F,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = match self.try_admit() {
            Ok(permit) => permit,
            Err(retry_after) => {
                metrics::counter!("circuit_breaker_rejections_total").increment(1);
                return Err(CircuitBreakerError::Open { retry_after });
            }
        };

        let outcome = match self.shared.config.call_timeout {
            Some(bound) => match timeout(bound, operation()).await {
                Ok(result) => result.map_err(CircuitBreakerError::Inner),
                Err(_) => Err(CircuitBreakerError::Timeout { timeout: bound }),
            },
            None => operation().await.map_err(CircuitBreakerError::Inner),
        };

        match outcome {
            Ok(value) => {
                permit.success();
                Ok(value)
            }
            Err(err) => {
                permit.failure();
                Err(err)
            }
        }
    }

    fn try_admit(&self) -> Result<CallPermit, Duration> {
        let mut core = self.shared.core.lock().unwrap();
        match core.state {
            CircuitState::Closed => Ok(self.permit(false)),
            CircuitState::Open => {
                let elapsed = core
                    .opened_at
                    .map(|opened_at| opened_at.elapsed())
                    .unwrap_or_default();
                let recovery = self.shared.config.recovery_interval;

                if elapsed >= recovery {
                    core.state = CircuitState::HalfOpen;
                    core.trial_in_flight = true;
                    tracing::info!("circuit half-open, admitting trial call");
                    Ok(self.permit(true))
                } else {
                    Err(recovery - elapsed)
                }
            }
            CircuitState::HalfOpen => {
                if core.trial_in_flight {
                    Err(Duration::ZERO)
                } else {
                    core.trial_in_flight = true;
                    Ok(self.permit(true))
                }
            }
        }
    }

    fn permit(&self, trial: bool) -> CallPermit {
        CallPermit {
            shared: self.shared.clone(),
            trial,
            resolved: false,
        }
    }
}

/// Tracks one admitted call. Dropping the permit without resolving it
/// records a failure, so a cancelled call counts against the circuit.
struct CallPermit {
    shared: Arc<Shared>,
    trial: bool,
    resolved: bool,
}

impl CallPermit {
    fn success(mut self) {
        self.resolved = true;
        let mut core = self.shared.core.lock().unwrap();
        core.consecutive_failures = 0;
        if self.trial {
            core.state = CircuitState::Closed;
            core.trial_in_flight = false;
            core.opened_at = None;
            tracing::info!("trial call succeeded, circuit closed");
            metrics::counter!("circuit_breaker_closed_total").increment(1);
        }
    }

    fn failure(mut self) {
        self.resolved = true;
        self.record_failure();
    }

    fn record_failure(&self) {
        let mut core = self.shared.core.lock().unwrap();
        if self.trial {
            tracing::warn!("trial call failed, circuit reopened");
            core.open();
        } else {
            core.consecutive_failures += 1;
            if core.state == CircuitState::Closed
                && core.consecutive_failures >= self.shared.config.failure_threshold.get()
            {
                tracing::warn!(
                    failures = core.consecutive_failures,
                    "failure threshold reached, circuit opened"
                );
                core.open();
            }
        }
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.resolved {
            self.record_failure();
        }
    }
}
