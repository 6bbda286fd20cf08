use harvest::{SourceId, TerminalReason};
use harvest_mock::{ScriptedFetcher, cursor_pages};

use crate::helpers::{Upstream, quiet_builder};

#[tokio::test(start_paused = true)]
async fn three_sources_two_full_pages_and_a_short_one() {
    let upstream = ["4133", "4134", "4135"]
        .iter()
        .fold(Upstream::new(), |u, s| {
            u.with(s, ScriptedFetcher::new().pages(cursor_pages(s, &[10, 10, 4])))
        });
    let harvester = quiet_builder()
        .concurrency(3)
        .page_size(10)
        .max_pages(10)
        .build()
        .unwrap();

    let report = harvester
        .run(["4133", "4134", "4135"], |s| upstream.fetcher_for(s))
        .await;

    assert!(report.is_complete());
    assert_eq!(report.per_source.len(), 3);
    for outcome in &report.per_source {
        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(outcome.reason, TerminalReason::PageShort);
        assert_eq!(outcome.records_fetched, 24);
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.error.is_none());
    }
    assert_eq!(report.records_fetched(), (10 + 10 + 4) * 3);
    assert_eq!(report.merged.len(), 72);
    for s in ["4133", "4134", "4135"] {
        assert_eq!(upstream.script(s).calls(), 3);
    }
}

#[tokio::test(start_paused = true)]
async fn outcomes_follow_input_order_and_duplicates_collapse() {
    let upstream = Upstream::new()
        .with("b", ScriptedFetcher::new().pages(cursor_pages("b", &[1])))
        .with("a", ScriptedFetcher::new().pages(cursor_pages("a", &[2])));
    let harvester = quiet_builder().page_size(5).build().unwrap();

    let report = harvester
        .run(
            vec![SourceId::from("b"), SourceId::from("a"), SourceId::from("b")],
            |s| upstream.fetcher_for(s),
        )
        .await;

    let order: Vec<_> = report.per_source.iter().map(|o| o.source.as_str()).collect();
    assert_eq!(order, vec!["b", "a"]);
    assert_eq!(upstream.script("b").calls(), 1);
    assert_eq!(report.merged.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn hung_attempt_times_out_and_the_walk_recovers() {
    let upstream = Upstream::new().with(
        "slow",
        ScriptedFetcher::new().hang().pages(cursor_pages("slow", &[3])),
    );
    let harvester = quiet_builder()
        .page_size(5)
        .attempt_timeout(std::time::Duration::from_secs(2))
        .build()
        .unwrap();

    let report = harvester.run(["slow"], |s| upstream.fetcher_for(s)).await;
    let outcome = &report.per_source[0];
    assert_eq!(outcome.reason, TerminalReason::PageShort);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(report.merged.len(), 3);
}

#[tokio::test]
async fn no_sources_yields_an_empty_report() {
    let harvester = quiet_builder().build().unwrap();
    let upstream = Upstream::new();
    let report = harvester
        .run(Vec::<SourceId>::new(), |s| upstream.fetcher_for(s))
        .await;
    assert!(report.per_source.is_empty());
    assert!(report.merged.is_empty());
    assert!(report.is_complete());
}
