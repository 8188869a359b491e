//! Retry policy and per-call retry state.

use std::time::Duration;

/// Retry policy shared by every call of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Hard cap on attempts per logical call, whatever the failure class.
    pub max_attempts: u32,
    /// Sleep when a rate-limited response carries no usable `Retry-After`.
    pub default_retry_after: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Zero disables jitter.
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_retry_after: Duration::from_secs(1),
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(8),
            jitter_max: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Delay requested by a `Retry-After` header value (whole seconds).
    pub fn retry_after(&self, header: Option<&str>) -> Duration {
        header
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default_retry_after)
    }

    /// Transport-failure backoff: `base * 2^(attempt-1)`, capped, plus jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = self
            .backoff_base
            .saturating_mul(1u32 << exponent)
            .min(self.backoff_max);
        delay + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.jitter_max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand_jitter() % (max_ms + 1))
    }
}

/// Pseudo-random value from the clock's sub-second nanos.
fn rand_jitter() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0)
}

/// Attempt counter for a single logical call. Never shared across calls.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempts: u32,
    max_attempts: u32,
    total_slept: Duration,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempts: 0,
            max_attempts: policy.max_attempts.max(1),
            total_slept: Duration::ZERO,
        }
    }

    /// Start the next attempt; returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True once the attempt cap is reached; no further sleep is scheduled.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Account for the sleep before the next attempt and return it.
    pub fn schedule(&mut self, delay: Duration) -> Duration {
        self.total_slept += delay;
        delay
    }

    /// Time spent sleeping between attempts so far.
    pub fn total_slept(&self) -> Duration {
        self.total_slept
    }
}
