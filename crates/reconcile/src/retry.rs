//! Delay schedule for re-checking a freshly created engagement.

use std::time::Duration;

/// Bounded re-check policy: how many times to look again after a create,
/// and how long to wait before each look.
///
/// The default is a single re-check after a one second pause. Raising
/// `max_attempts` trades request latency for fewer false "not visible"
/// failures when the tracker lags under load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each attempt. `1` keeps a
    /// fixed delay.
    pub backoff_factor: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// `attempts` re-checks, each after the same `delay`.
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: attempts,
            initial_delay: delay,
            backoff_factor: 1,
            max_delay: delay,
        }
    }

    /// Delay to wait before each attempt, in order.
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::with_capacity(self.max_attempts as usize);
        let mut next = self.initial_delay.min(self.max_delay);
        for _ in 0..self.max_attempts {
            delays.push(next);
            next = next
                .saturating_mul(self.backoff_factor.max(1))
                .min(self.max_delay);
        }
        delays
    }

    /// Worst-case time spent sleeping under this policy.
    pub fn total_delay(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}
