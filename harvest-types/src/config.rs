//! Configuration types shared across the orchestrator and its middleware.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

/// How the paginator advances when a full page arrives without a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PaginationMode {
    /// Opaque cursor pagination; a full page without a next cursor ends the walk.
    #[default]
    Cursor,
    /// Page-number pagination; a full page without a cursor advances the page index.
    PageNumber,
}

/// Adaptive token-bucket settings for one upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Initial (and maximum) capacity, in tokens per second.
    pub capacity: u32,
    /// Capacity never shrinks below this floor.
    pub min_capacity: u32,
    /// Upper bound of the random delay added after each admission. Zero disables it.
    pub jitter_max_ms: u64,
    /// Cooldown base for HTTP 403 denials.
    pub forbidden_cooldown_ms: u64,
    /// Cooldown base for HTTP 429 and 5xx denials.
    pub throttled_cooldown_ms: u64,
    /// Geometric growth applied to the cooldown base per attempt.
    pub cooldown_factor: f64,
    /// Cooldown never exceeds this.
    pub max_cooldown_ms: u64,
    /// Probability in `[0, 1]` that a success grows capacity by one token.
    pub recovery_probability: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            min_capacity: 2,
            jitter_max_ms: 50,
            forbidden_cooldown_ms: 2_000,
            throttled_cooldown_ms: 1_500,
            cooldown_factor: 1.5,
            max_cooldown_ms: 8_000,
            recovery_probability: 0.03,
        }
    }
}

impl RateLimitConfig {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the floor is zero or above the capacity, or when
    /// the recovery probability or cooldown factor is out of range.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.min_capacity == 0 {
            return Err(HarvestError::InvalidArg(
                "rate limit min_capacity must be at least 1".into(),
            ));
        }
        if self.min_capacity > self.capacity {
            return Err(HarvestError::InvalidArg(format!(
                "rate limit min_capacity {} exceeds capacity {}",
                self.min_capacity, self.capacity
            )));
        }
        if !(0.0..=1.0).contains(&self.recovery_probability) {
            return Err(HarvestError::InvalidArg(format!(
                "recovery_probability {} outside [0, 1]",
                self.recovery_probability
            )));
        }
        if !(self.cooldown_factor >= 1.0) {
            return Err(HarvestError::InvalidArg(format!(
                "cooldown_factor {} must be >= 1",
                self.cooldown_factor
            )));
        }
        Ok(())
    }
}

/// Geometric retry backoff for transient failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Growth factor applied per retry (>= 1).
    pub factor: f64,
    /// Upper bound for the un-jittered delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Random jitter percentage [0, 100] added on top of each delay.
    pub jitter_percent: u8,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 250,
            factor: 1.5,
            max_delay_ms: 8_000,
            jitter_percent: 20,
        }
    }
}

impl RetryConfig {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a growth factor below one or a jitter above 100%.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if !(self.factor >= 1.0) {
            return Err(HarvestError::InvalidArg(format!(
                "retry factor {} must be >= 1",
                self.factor
            )));
        }
        if self.jitter_percent > 100 {
            return Err(HarvestError::InvalidArg(format!(
                "retry jitter_percent {} exceeds 100",
                self.jitter_percent
            )));
        }
        Ok(())
    }
}

/// Per-source pagination limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records requested per page; a page with fewer is the last one.
    pub page_size: u32,
    /// Hard ceiling on fetched pages per source.
    pub max_pages: u32,
    /// Advancement rule for full pages without a cursor.
    pub mode: PaginationMode,
    /// Pause between consecutive pages of the same source, in milliseconds.
    pub page_delay_ms: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: 10,
            mode: PaginationMode::Cursor,
            page_delay_ms: 0,
        }
    }
}

impl PaginationConfig {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `page_size` or `max_pages` is zero.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.page_size == 0 {
            return Err(HarvestError::InvalidArg("page_size must be at least 1".into()));
        }
        if self.max_pages == 0 {
            return Err(HarvestError::InvalidArg("max_pages must be at least 1".into()));
        }
        Ok(())
    }
}

/// Global configuration for one harvest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Maximum number of sources walked concurrently.
    pub concurrency: usize,
    /// Timeout applied to every individual upstream attempt.
    pub attempt_timeout: Duration,
    /// Optional deadline for the whole run; on expiry in-flight walks are cancelled.
    pub run_timeout: Option<Duration>,
    /// Shared rate limiter settings.
    pub rate_limit: RateLimitConfig,
    /// Retry policy settings.
    pub retry: RetryConfig,
    /// Pagination settings applied to every source.
    pub pagination: PaginationConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            attempt_timeout: Duration::from_secs(15),
            run_timeout: None,
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl HarvestConfig {
    /// Validate every section of the configuration.
    ///
    /// # Errors
    /// Returns the first `InvalidArg` found.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.concurrency == 0 {
            return Err(HarvestError::InvalidArg("concurrency must be at least 1".into()));
        }
        if self.attempt_timeout.is_zero() {
            return Err(HarvestError::InvalidArg("attempt_timeout must be non-zero".into()));
        }
        self.rate_limit.validate()?;
        self.retry.validate()?;
        self.pagination.validate()
    }
}
