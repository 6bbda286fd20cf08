use std::time::Duration;

use harvest::{HarvestError, Harvester, RateLimitConfig};

#[test]
fn defaults_build() {
    let h = Harvester::builder().build().unwrap();
    assert_eq!(h.config().concurrency, 3);
    assert_eq!(h.config().pagination.max_pages, 10);
    assert_eq!(h.config().attempt_timeout, Duration::from_secs(15));
}

#[test]
fn zero_concurrency_is_rejected() {
    let err = Harvester::builder().concurrency(0).build().unwrap_err();
    assert!(matches!(err, HarvestError::InvalidArg(_)));
}

#[test]
fn floor_above_capacity_is_rejected() {
    let err = Harvester::builder()
        .rate_limit(RateLimitConfig {
            capacity: 2,
            min_capacity: 4,
            ..RateLimitConfig::default()
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, HarvestError::InvalidArg(_)));
}

#[test]
fn zero_page_size_is_rejected() {
    assert!(Harvester::builder().page_size(0).build().is_err());
    assert!(Harvester::builder().max_pages(0).build().is_err());
}

#[test]
fn page_delay_is_stored_in_millis() {
    let h = Harvester::builder()
        .page_delay(Duration::from_millis(750))
        .build()
        .unwrap();
    assert_eq!(h.config().pagination.page_delay_ms, 750);
}
