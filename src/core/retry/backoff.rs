//! Bounded exponential backoff with jitter

use crate::config::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// Computes retry delays: `min(max_delay, 2^attempt)` seconds plus up to 10% jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    max_delay: Duration,
}

impl BackoffPolicy {
    /// Jitter upper bound as a fraction of the base delay
    pub const JITTER_FRACTION: f64 = 0.1;

    /// Create a policy capped at `max_delay`
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    /// Policy from the `[retry]` configuration section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(Duration::from_secs(config.max_delay_secs))
    }

    /// Delay before retrying without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        // Clamp the exponent so the shift cannot overflow
        let exponential = Duration::from_secs(1u64 << attempt.min(32));
        exponential.min(self.max_delay)
    }

    /// Delay before retrying, with uniform jitter in `[0, 0.1 × base]`
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = rand::thread_rng().gen_range(0.0..=Self::JITTER_FRACTION);
        base + base.mul_f64(jitter)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(32))
    }
}
