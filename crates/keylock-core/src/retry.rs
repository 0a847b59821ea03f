//! Acquisition retry policy
//!
//! Lock availability is polled, not pushed, so contending clients must
//! retry. An unconditional tight loop wastes CPU and hammers the store from
//! every waiter at once; this policy bounds the loop by attempts and/or a
//! deadline and spaces attempts with jittered exponential backoff.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Cooperative retry policy for lock acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts; `None` means unbounded
    pub max_attempts: Option<u32>,
    /// Overall deadline measured from the first attempt; `None` means none
    pub deadline: Option<Duration>,
    /// Backoff before the second attempt
    pub initial_backoff: Duration,
    /// Upper bound on any single backoff
    pub max_backoff: Duration,
    /// Growth factor between attempts
    pub multiplier: f64,
    /// Fraction of each backoff randomly shaved off, in `[0.0, 1.0]`
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            deadline: None,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(500),
            multiplier: 2.0,
            jitter: 0.5,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Whether the budget is spent after `attempt` failed attempts
    pub fn is_exhausted(&self, attempt: u32, started: Instant) -> bool {
        if let Some(max_attempts) = self.max_attempts {
            if attempt >= max_attempts {
                return true;
            }
        }
        if let Some(deadline) = self.deadline {
            if started.elapsed() >= deadline {
                return true;
            }
        }
        false
    }

    /// Backoff to sleep before attempt `attempt + 1`
    ///
    /// Exponential in the attempt number, capped at `max_backoff`, with up
    /// to `jitter` of the value randomly removed so contending waiters
    /// spread out.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let base = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exp as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);

        let jitter = self.jitter.clamp(0.0, 1.0);
        let shave = capped * jitter * rand::random::<f64>();
        Duration::from_millis((capped - shave).max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(1_000_000, Instant::now()));
    }

    #[test]
    fn test_max_attempts_exhaustion() {
        let policy = RetryPolicy::default().with_max_attempts(3);
        let started = Instant::now();
        assert!(!policy.is_exhausted(2, started));
        assert!(policy.is_exhausted(3, started));
        assert!(policy.is_exhausted(4, started));
    }

    #[test]
    fn test_deadline_exhaustion() {
        let policy = RetryPolicy::default().with_deadline(Duration::from_millis(10));
        let started = Instant::now() - Duration::from_millis(20);
        assert!(policy.is_exhausted(1, started));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.backoff_for(1), Duration::from_millis(10));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(20));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(40));
        // Far attempts hit the cap
        assert_eq!(policy.backoff_for(20), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::default();
        for attempt in 1..10 {
            let backoff = policy.backoff_for(attempt);
            assert!(backoff <= policy.max_backoff);
        }
    }
}
