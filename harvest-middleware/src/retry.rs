use std::time::Duration;

use harvest_types::{HarvestError, RetryConfig};

use crate::backoff::{geometric_ms, jitter_wait};

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`.
    Retry {
        /// Backoff before the next attempt, jitter included.
        delay: Duration,
    },
    /// Stop; the failure is final for this request.
    GiveUp,
}

/// Decides whether and when a failed attempt is retried.
///
/// 429, 403, 5xx, network errors and attempt timeouts are retried up to
/// `max_retries` times; everything else is final on the first failure.
/// Independent of the rate limiter's cooldown, which also applies because the
/// retried attempt goes through admission again.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Build a policy from its configuration.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Upper bound on attempts for one request, the first one included.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.config.max_retries.saturating_add(1)
    }

    /// Classify the failure of attempt number `attempt` (1-based).
    #[must_use]
    pub fn classify(&self, attempt: u32, err: &HarvestError) -> RetryDecision {
        if !err.is_retryable() || attempt > self.config.max_retries {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry {
            delay: self.delay_after(attempt),
        }
    }

    /// Backoff after attempt number `attempt` failed: `base * factor^(attempt-1)`,
    /// capped, plus up to `jitter_percent` on top.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let base = geometric_ms(
            self.config.base_delay_ms,
            self.config.factor,
            attempt.saturating_sub(1),
            self.config.max_delay_ms,
        );
        Duration::from_millis(jitter_wait(base, u32::from(self.config.jitter_percent)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
