use std::time::Duration;

use rand::Rng;

/// Add up to `jitter_percent` percent of `base_ms`, chosen uniformly.
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, (base_ms.saturating_mul(u64::from(jitter_percent))) / 100)
    };
    let mut rng = rand::rng();
    base_ms + rng.random_range(0..jitter_range)
}

/// `base_ms * factor^exponent`, capped at `cap_ms`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn geometric_ms(base_ms: u64, factor: f64, exponent: u32, cap_ms: u64) -> u64 {
    let exp = i32::try_from(exponent).unwrap_or(i32::MAX);
    let raw = base_ms as f64 * factor.powi(exp);
    if !raw.is_finite() || raw >= cap_ms as f64 {
        cap_ms
    } else if raw <= 0.0 {
        0
    } else {
        raw as u64
    }
}

/// Uniform random delay in `[0, max_ms]`. Zero disables it.
pub fn spread(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}
