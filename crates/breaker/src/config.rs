//! Circuit breaker configuration.

use std::num::NonZeroU32;
use std::time::Duration;

/// Default number of consecutive failures that opens the circuit.
pub const DEFAULT_FAILURE_THRESHOLD: NonZeroU32 = NonZeroU32::new(5).unwrap();

/// Default time the circuit stays open before admitting a trial call.
pub const DEFAULT_RECOVERY_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for a circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures while Closed that open the circuit.
    pub failure_threshold: NonZeroU32,

    /// How long the circuit stays Open before one trial call is admitted.
    pub recovery_interval: Duration,

    /// Upper bound on a single wrapped call. An elapsed call counts as a
    /// failure. None leaves calls unbounded.
    pub call_timeout: Option<Duration>,
}

impl CircuitBreakerConfig {
    /// Creates a configuration with no call timeout.
    pub fn new(failure_threshold: NonZeroU32, recovery_interval: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_interval,
            call_timeout: None,
        }
    }

    /// Sets an upper bound on each wrapped call.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = Some(call_timeout);
        self
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_interval: DEFAULT_RECOVERY_INTERVAL,
            call_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold.get(), 5);
        assert_eq!(config.recovery_interval, Duration::from_secs(30));
        assert!(config.call_timeout.is_none());
    }

    #[test]
    fn with_call_timeout() {
        let config = CircuitBreakerConfig::default().with_call_timeout(Duration::from_secs(2));
        assert_eq!(config.call_timeout, Some(Duration::from_secs(2)));
    }
}
