use std::sync::Arc;

use harvest::{RateLimitConfig, RateLimiter, TerminalReason};
use harvest_mock::{ScriptedFetcher, cursor_pages};
use tokio::time::Instant;

use crate::helpers::{Upstream, quiet_builder};

#[tokio::test(start_paused = true)]
async fn throttled_page_is_retried_twice_and_capacity_halves_twice() {
    let upstream = Upstream::new().with(
        "lead-1",
        ScriptedFetcher::new()
            .status(429)
            .status(429)
            .pages(cursor_pages("lead-1", &[4])),
    );
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        jitter_max_ms: 0,
        recovery_probability: 0.0,
        ..RateLimitConfig::default()
    }));
    let harvester = quiet_builder()
        .page_size(10)
        .shared_rate_limiter(Arc::clone(&limiter))
        .build()
        .unwrap();

    let started = Instant::now();
    let report = harvester.run(["lead-1"], |s| upstream.fetcher_for(s)).await;

    let outcome = &report.per_source[0];
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.reason, TerminalReason::PageShort);
    assert_eq!(report.merged.len(), 4);
    assert_eq!(limiter.snapshot().capacity, 2);
    // cooldowns of 1500ms and 2250ms had to be waited out
    assert!(started.elapsed() >= std::time::Duration::from_millis(3_750));
}

#[tokio::test(start_paused = true)]
async fn denial_on_one_source_slows_its_siblings() {
    let upstream = Upstream::new()
        .with(
            "noisy",
            ScriptedFetcher::new()
                .status(403)
                .pages(cursor_pages("noisy", &[1])),
        )
        .with(
            "quiet",
            ScriptedFetcher::new().pages(cursor_pages("quiet", &[2, 2, 2, 1])),
        );
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        jitter_max_ms: 0,
        recovery_probability: 0.0,
        ..RateLimitConfig::default()
    }));
    let harvester = quiet_builder()
        .concurrency(2)
        .page_size(2)
        .shared_rate_limiter(Arc::clone(&limiter))
        .build()
        .unwrap();

    let report = harvester
        .run(["noisy", "quiet"], |s| upstream.fetcher_for(s))
        .await;

    assert!(report.is_complete());
    assert_eq!(limiter.snapshot().capacity, 5);
    let quiet = report.outcome(&"quiet".into()).unwrap();
    assert_eq!(quiet.pages_fetched, 4);
}
