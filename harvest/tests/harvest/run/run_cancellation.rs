use std::time::Duration;

use harvest::{HarvestError, TerminalReason};
use harvest_mock::{ScriptedFetcher, cursor_pages};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::helpers::{Upstream, quiet_builder};

#[tokio::test(start_paused = true)]
async fn run_deadline_cancels_in_flight_and_skips_queued_sources() {
    let upstream = Upstream::new()
        .with(
            "stuck",
            ScriptedFetcher::new()
                .pages(cursor_pages("stuck", &[2]))
                .hang(),
        )
        .with("queued", ScriptedFetcher::new().pages(cursor_pages("queued", &[1])));
    let harvester = quiet_builder()
        .concurrency(1)
        .page_size(2)
        .attempt_timeout(Duration::from_secs(60))
        .run_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let started = Instant::now();
    let report = harvester
        .run(["stuck", "queued"], |s| upstream.fetcher_for(s))
        .await;

    assert!(started.elapsed() < Duration::from_secs(6));

    let stuck = report.outcome(&"stuck".into()).unwrap();
    assert_eq!(stuck.reason, TerminalReason::Error);
    assert_eq!(stuck.error, Some(HarvestError::Cancelled));
    assert_eq!(stuck.pages_fetched, 1);

    let queued = report.outcome(&"queued".into()).unwrap();
    assert_eq!(queued.error, Some(HarvestError::Cancelled));
    assert_eq!(queued.attempts, 0);
    assert_eq!(upstream.script("queued").calls(), 0);

    // the page fetched before the deadline survives
    assert_eq!(report.merged.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn run_that_beats_its_deadline_is_unaffected() {
    let upstream = Upstream::new().with("a", ScriptedFetcher::new().pages(cursor_pages("a", &[1])));
    let harvester = quiet_builder()
        .page_size(2)
        .run_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let started = Instant::now();
    let report = harvester.run(["a"], |s| upstream.fetcher_for(s)).await;
    assert!(report.is_complete());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn external_token_cancels_backoff_wait() {
    let upstream = Upstream::new().with("busy", ScriptedFetcher::new().status(429));
    let cancel = CancellationToken::new();
    let harvester = quiet_builder()
        .cancellation(cancel.clone())
        .build()
        .unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });
    let report = harvester.run(["busy"], |s| upstream.fetcher_for(s)).await;

    let outcome = &report.per_source[0];
    assert_eq!(outcome.error, Some(HarvestError::Cancelled));
    assert_eq!(outcome.attempts, 1);
}
