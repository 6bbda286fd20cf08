use std::time::Duration;

use chrono::DateTime;
use harvest::{Page, PaginationConfig, PaginationMode, Paginator, SourceId, TimeRange};
use harvest_mock::{ScriptedFetcher, page_records};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn cursor_and_page_number_advance_together() {
    let script = ScriptedFetcher::new()
        .page(Page::new(page_records("s", 1, 5)).with_next_cursor(1_700_000_000_000i64))
        .page(Page::new(page_records("s", 2, 5)))
        .page(Page::new(page_records("s", 3, 2)));
    let walk = Paginator::new(PaginationConfig {
        page_size: 5,
        max_pages: 10,
        mode: PaginationMode::PageNumber,
        page_delay_ms: 0,
    })
    .walk(SourceId::from("s"), &script, &CancellationToken::new())
    .await;
    assert_eq!(walk.pages_fetched, 3);

    let reqs = script.requests();
    let pages: Vec<_> = reqs.iter().map(|r| r.page).collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert_eq!(reqs[0].cursor, None);
    assert_eq!(
        reqs[1].cursor.as_ref().map(|c| c.as_str().to_string()),
        Some("1700000000000".to_string())
    );
    assert_eq!(reqs[2].cursor, None);
    assert!(reqs.iter().all(|r| r.page_size == 5 && r.source.as_str() == "s"));
}

#[tokio::test]
async fn time_range_is_forwarded_on_every_request() {
    let end = DateTime::from_timestamp(1_760_000_000, 0).unwrap();
    let range = TimeRange::trailing_from(end, Duration::from_secs(30 * 24 * 3600)).unwrap();
    let script = ScriptedFetcher::new()
        .page(Page::new(page_records("s", 1, 2)).with_next_cursor("c2"))
        .page(Page::new(page_records("s", 2, 1)));
    let _ = Paginator::new(PaginationConfig {
        page_size: 2,
        ..PaginationConfig::default()
    })
    .with_time_range(Some(range))
    .walk(SourceId::from("s"), &script, &CancellationToken::new())
    .await;

    let reqs = script.requests();
    assert_eq!(reqs.len(), 2);
    assert!(reqs.iter().all(|r| r.time_range == Some(range)));
}

#[tokio::test(start_paused = true)]
async fn pauses_between_pages_but_not_before_the_first() {
    let script = ScriptedFetcher::new()
        .page(Page::new(page_records("s", 1, 2)).with_next_cursor("c2"))
        .page(Page::new(page_records("s", 2, 2)).with_next_cursor("c3"))
        .page(Page::new(Vec::new()));
    let started = tokio::time::Instant::now();
    let walk = Paginator::new(PaginationConfig {
        page_size: 2,
        page_delay_ms: 300,
        ..PaginationConfig::default()
    })
    .walk(SourceId::from("s"), &script, &CancellationToken::new())
    .await;
    assert_eq!(walk.pages_fetched, 3);
    assert_eq!(started.elapsed(), Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_inter_page_pause() {
    let script = ScriptedFetcher::new()
        .page(Page::new(page_records("s", 1, 2)).with_next_cursor("c2"));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    let walk = Paginator::new(PaginationConfig {
        page_size: 2,
        page_delay_ms: 10_000,
        ..PaginationConfig::default()
    })
    .walk(SourceId::from("s"), &script, &cancel)
    .await;
    assert_eq!(walk.reason, harvest::TerminalReason::Error);
    assert!(walk.error.as_ref().is_some_and(harvest::HarvestError::is_cancelled));
    assert_eq!(walk.records.len(), 2);
    assert_eq!(script.calls(), 1);
}
