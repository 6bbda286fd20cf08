use harvest::{
    HarvestError, Page, PaginationConfig, PaginationMode, Paginator, SourceId, TerminalReason,
};
use harvest_mock::{MockRecord, ScriptedFetcher, Step, page_records};
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

const PAGE_SIZE: u32 = 4;

fn arb_step() -> impl Strategy<Value = Step<MockRecord>> {
    let page = (
        0usize..=PAGE_SIZE as usize,
        prop::option::of(0u8..3),
        prop::option::of(0u64..12),
        1u32..50,
    )
        .prop_map(|(len, cursor, total, tag)| {
            let mut p = Page::new(page_records("s", tag, len));
            if let Some(c) = cursor {
                p = p.with_next_cursor(format!("c{c}"));
            }
            if let Some(t) = total {
                p = p.with_total(t);
            }
            Step::Page(p)
        });
    prop_oneof![
        9 => page,
        1 => Just(Step::Fail(HarvestError::http(404, "gone"))),
    ]
}

fn arb_mode() -> impl Strategy<Value = PaginationMode> {
    prop_oneof![Just(PaginationMode::Cursor), Just(PaginationMode::PageNumber)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn every_walk_terminates_within_the_page_ceiling(
        steps in proptest::collection::vec(arb_step(), 1..30),
        max_pages in 1u32..12,
        mode in arb_mode(),
    ) {
        let script = steps
            .into_iter()
            .fold(ScriptedFetcher::new(), ScriptedFetcher::then);
        let paginator = Paginator::new(PaginationConfig {
            page_size: PAGE_SIZE,
            max_pages,
            mode,
            page_delay_ms: 0,
        });
        let walk = tokio_test::block_on(async {
            paginator
                .walk(SourceId::from("s"), &script, &CancellationToken::new())
                .await
        });

        prop_assert!(script.calls() <= max_pages as usize);
        prop_assert!(walk.pages_fetched <= max_pages);
        prop_assert_eq!(walk.error.is_some(), walk.reason == TerminalReason::Error);
        prop_assert!(matches!(
            walk.reason,
            TerminalReason::PageShort
                | TerminalReason::NoCursor
                | TerminalReason::LoopDetected
                | TerminalReason::MaxPages
                | TerminalReason::TotalReached
                | TerminalReason::Error
        ));
    }
}
