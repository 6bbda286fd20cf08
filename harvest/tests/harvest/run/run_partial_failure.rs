use harvest::{HarvestError, TerminalReason};
use harvest_mock::{ScriptedFetcher, cursor_pages};

use crate::helpers::{Upstream, quiet_builder};

#[tokio::test(start_paused = true)]
async fn fatal_source_does_not_affect_healthy_one() {
    let upstream = Upstream::new()
        .with("x", ScriptedFetcher::new().status(404))
        .with("y", ScriptedFetcher::new().pages(cursor_pages("y", &[5, 2])));
    let harvester = quiet_builder().page_size(5).build().unwrap();

    let report = harvester.run(["x", "y"], |s| upstream.fetcher_for(s)).await;

    assert!(!report.is_complete());
    let failures: Vec<_> = report.failures().map(|o| o.source.as_str()).collect();
    assert_eq!(failures, vec!["x"]);

    let x = report.outcome(&"x".into()).unwrap();
    assert_eq!(x.reason, TerminalReason::Error);
    assert_eq!(x.error.as_ref().and_then(HarvestError::status), Some(404));
    assert_eq!(x.attempts, 1);
    assert_eq!(x.pages_fetched, 0);

    assert_eq!(report.merged.len(), 7);
    assert!(report.merged.values().all(|r| r.source.as_str() == "y"));
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_are_reported_with_attempt_count() {
    let upstream = Upstream::new().with("down", ScriptedFetcher::new().status(502));
    let harvester = quiet_builder().build().unwrap();

    let report = harvester.run(["down"], |s| upstream.fetcher_for(s)).await;

    let outcome = &report.per_source[0];
    assert_eq!(outcome.attempts, 4);
    assert!(matches!(
        outcome.error,
        Some(HarvestError::RetriesExhausted { attempts: 4, .. })
    ));
    assert_eq!(upstream.script("down").calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn failure_mid_walk_keeps_partial_records_in_the_merge() {
    let upstream = Upstream::new().with(
        "z",
        ScriptedFetcher::new()
            .pages(cursor_pages("z", &[3, 3]))
            .fail(HarvestError::contract("records field missing")),
    );
    let harvester = quiet_builder().page_size(3).build().unwrap();

    let report = harvester.run(["z"], |s| upstream.fetcher_for(s)).await;

    let outcome = &report.per_source[0];
    assert_eq!(outcome.reason, TerminalReason::Error);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.records_fetched, 6);
    assert_eq!(report.merged.len(), 6);
    assert!(matches!(outcome.error, Some(HarvestError::Contract(_))));
}
