//! Retry policy configuration

use std::time::Duration;

/// Retry policy for idempotent REST calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Initial retry interval
    pub initial_interval: Duration,
    /// Backoff coefficient (multiplier for each retry)
    pub backoff_coefficient: f64,
    /// Maximum retry interval
    pub maximum_interval: Duration,
    /// Maximum number of attempts, including the first one
    pub maximum_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(10),
            maximum_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum attempts
    pub fn with_maximum_attempts(mut self, attempts: u32) -> Self {
        self.maximum_attempts = attempts.max(1);
        self
    }

    /// Delay before the retry that follows attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let delay_nanos =
            self.initial_interval.as_nanos() as f64 * self.backoff_coefficient.powi(exponent);
        let capped = delay_nanos.min(self.maximum_interval.as_nanos() as f64);
        Duration::from_nanos(capped as u64)
    }
}
