//! Exponential backoff with random jitter for generation calls.

use edurag_core::RetrySettings;
use rand::Rng;
use std::time::Duration;

/// Attempt budget and delay shape for one kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_jitter,
        }
    }

    /// Delay before retrying after the given failed attempt (1-based).
    ///
    /// `base * 2^(attempt-1)` plus a uniform jitter in `[0, max_jitter]`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay + self.jitter()
    }

    /// Delay before the next attempt, preferring a server hint over backoff.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint + self.jitter(),
            None => self.backoff(attempt),
        }
    }

    /// Whether another attempt is allowed after `attempt` failed.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_millis(settings.base_delay_ms),
            Duration::from_millis(settings.max_jitter_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, jitter_ms: u64) -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(base_ms), Duration::from_millis(jitter_ms))
    }

    #[test]
    fn test_backoff_doubles_without_jitter() {
        let policy = policy(1000, 0);
        assert_eq!(policy.backoff(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let policy = policy(1000, 1000);
        for _ in 0..100 {
            let delay = policy.backoff(2);
            assert!(delay >= Duration::from_millis(2000));
            assert!(delay <= Duration::from_millis(3000));
        }
    }

    #[test]
    fn test_hint_overrides_backoff() {
        let policy = policy(1000, 0);
        assert_eq!(
            policy.delay_for(3, Some(Duration::from_secs(7))),
            Duration::from_secs(7)
        );
        assert_eq!(policy.delay_for(1, None), Duration::from_millis(1000));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy::from(RetrySettings::new(5, 1000, 1000));
        assert_eq!(policy.max_attempts, 5);
        assert!(policy.allows_retry(4));
        assert!(!policy.allows_retry(5));

        // Zero is clamped to a single attempt
        let policy = RetryPolicy::from(RetrySettings::new(0, 1, 0));
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.allows_retry(1));
    }
}
