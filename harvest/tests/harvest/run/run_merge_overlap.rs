use harvest::Page;
use harvest_mock::{MockRecord, ScriptedFetcher};

use crate::helpers::{Upstream, quiet_builder};

async fn harvest_two(first: i64, second: i64) -> MockRecord {
    let upstream = Upstream::new()
        .with(
            "a",
            ScriptedFetcher::new().page(Page::new(vec![MockRecord::new("ORD-1", first).with_source("a")])),
        )
        .with(
            "b",
            ScriptedFetcher::new().page(Page::new(vec![
                MockRecord::new("ORD-1", second).with_source("b"),
                MockRecord::new("ORD-2", 50).with_source("b"),
            ])),
        );
    let report = quiet_builder()
        .page_size(10)
        .build()
        .unwrap()
        .run(["a", "b"], |s| upstream.fetcher_for(s))
        .await;
    assert_eq!(report.merged.len(), 2);
    report.merged.get(&"ORD-1".to_string()).cloned().unwrap()
}

#[tokio::test(start_paused = true)]
async fn most_recent_duplicate_wins_in_either_order() {
    assert_eq!(harvest_two(100, 200).await.recency, 200);
    assert_eq!(harvest_two(200, 100).await.recency, 200);
}

#[tokio::test(start_paused = true)]
async fn equal_recency_keeps_the_earlier_source() {
    let winner = harvest_two(100, 100).await;
    assert_eq!(winner.source.as_str(), "a");
}
