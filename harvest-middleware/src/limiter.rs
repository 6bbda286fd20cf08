//! Adaptive token bucket shared by every walk hitting the same upstream.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use harvest_types::RateLimitConfig;
use rand::Rng;
use tokio::time::Instant;

use crate::backoff;

/// What the caller observed after an admitted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The upstream answered normally.
    Success,
    /// The upstream pushed back (429, 403 or 5xx).
    Denied {
        /// HTTP status of the denial.
        status: u16,
        /// 0-based index of the attempt that was denied; grows the cooldown.
        attempt: u32,
    },
}

/// Point-in-time view of the limiter, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterSnapshot {
    /// Tokens currently available, refilled up to now.
    pub tokens: f64,
    /// Current effective capacity in tokens per second.
    pub capacity: u32,
    /// End of the active cooldown, if any.
    pub cooldown_until: Option<Instant>,
}

struct LimiterState {
    tokens: f64,
    capacity: u32,
    last_refill: Instant,
    cooldown_until: Option<Instant>,
}

impl LimiterState {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        let cap = f64::from(self.capacity);
        self.tokens = (self.tokens + elapsed * cap).min(cap);
        self.last_refill = now;
    }

    fn cooldown_remaining(&mut self, now: Instant) -> Option<Duration> {
        match self.cooldown_until {
            Some(until) if now < until => Some(until - now),
            Some(_) => {
                self.cooldown_until = None;
                None
            }
            None => None,
        }
    }
}

/// Token-bucket admission control with adaptive capacity.
///
/// Capacity starts at the configured value, halves on every denial (never
/// below `min_capacity`) and creeps back up by one token with a small
/// probability per success. A denial also opens a cooldown window during
/// which no admission is granted.
///
/// The limiter never fails; it only delays.
pub struct RateLimiter {
    max_capacity: u32,
    min_capacity: u32,
    config: RateLimitConfig,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Build a limiter with a full bucket.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        let min_capacity = config.min_capacity.max(1);
        let max_capacity = config.capacity.max(min_capacity);
        Self {
            max_capacity,
            min_capacity,
            state: Mutex::new(LimiterState {
                tokens: f64::from(max_capacity),
                capacity: max_capacity,
                last_refill: Instant::now(),
                cooldown_until: None,
            }),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a token if one is available right now, otherwise return how long to wait.
    fn reserve(&self) -> Result<(), Duration> {
        let mut st = self.lock();
        let now = Instant::now();
        if let Some(wait) = st.cooldown_remaining(now) {
            return Err(wait);
        }
        st.refill(now);
        if st.tokens >= 1.0 {
            st.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - st.tokens;
            Err(Duration::from_secs_f64(missing / f64::from(st.capacity)))
        }
    }

    /// Non-blocking variant of [`admit`](Self::admit), without jitter.
    pub fn try_admit(&self) -> bool {
        self.reserve().is_ok()
    }

    /// Wait until a token is available and take it.
    ///
    /// Adds a random delay of up to `jitter_max_ms` afterwards, then waits out
    /// any cooldown opened in the meantime, so no caller is released inside a
    /// cooldown window.
    pub async fn admit(&self) {
        loop {
            match self.reserve() {
                Ok(()) => break,
                Err(wait) => tokio::time::sleep(wait).await,
            }
        }
        let jitter = backoff::spread(self.config.jitter_max_ms);
        if !jitter.is_zero() {
            tokio::time::sleep(jitter).await;
        }
        loop {
            let wait = self.lock().cooldown_remaining(Instant::now());
            match wait {
                Some(wait) => tokio::time::sleep(wait).await,
                None => break,
            }
        }
    }

    /// Feed back the result of an admitted attempt.
    pub fn report(&self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.on_success(),
            Outcome::Denied { status, attempt } => self.on_denied(status, attempt),
        }
    }

    fn on_success(&self) {
        let p = self.config.recovery_probability;
        let mut st = self.lock();
        if st.capacity >= self.max_capacity {
            return;
        }
        if p > 0.0 && rand::rng().random::<f64>() < p {
            let now = Instant::now();
            st.refill(now);
            st.capacity += 1;
            #[cfg(feature = "tracing")]
            tracing::debug!(capacity = st.capacity, "rate limiter capacity recovered");
        }
    }

    fn on_denied(&self, status: u16, attempt: u32) {
        let base = if status == 403 {
            self.config.forbidden_cooldown_ms
        } else {
            self.config.throttled_cooldown_ms
        };
        let cooldown_ms = backoff::geometric_ms(
            base,
            self.config.cooldown_factor,
            attempt,
            self.config.max_cooldown_ms,
        );
        let now = Instant::now();
        let until = now + Duration::from_millis(cooldown_ms);

        let mut st = self.lock();
        st.refill(now);
        st.capacity = (st.capacity / 2).max(self.min_capacity);
        st.tokens = st.tokens.min(f64::from(st.capacity));
        st.cooldown_until = Some(st.cooldown_until.map_or(until, |cur| cur.max(until)));
        #[cfg(feature = "tracing")]
        tracing::warn!(
            status,
            attempt,
            capacity = st.capacity,
            cooldown_ms,
            "upstream denied request; shrinking rate limiter capacity"
        );
    }

    /// Current state, refilled up to now.
    #[must_use]
    pub fn snapshot(&self) -> LimiterSnapshot {
        let mut st = self.lock();
        let now = Instant::now();
        st.refill(now);
        let _ = st.cooldown_remaining(now);
        LimiterSnapshot {
            tokens: st.tokens,
            capacity: st.capacity,
            cooldown_until: st.cooldown_until,
        }
    }

    /// Capacity floor.
    #[must_use]
    pub const fn min_capacity(&self) -> u32 {
        self.min_capacity
    }

    /// Capacity ceiling (the configured starting capacity).
    #[must_use]
    pub const fn max_capacity(&self) -> u32 {
        self.max_capacity
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.snapshot();
        f.debug_struct("RateLimiter")
            .field("capacity", &snap.capacity)
            .field("tokens", &snap.tokens)
            .field("min_capacity", &self.min_capacity)
            .field("max_capacity", &self.max_capacity)
            .finish()
    }
}
