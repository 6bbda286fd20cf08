mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Order, SimulatedFeed};
use harvest::{Harvester, PageFetcher, SourceId, TimeRange};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,harvest=debug cargo run --example basic_harvest --features tracing
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();

    let harvester = Harvester::builder()
        .concurrency(2)
        .page_size(10)
        .max_pages(5)
        .page_delay(Duration::from_millis(50))
        .time_range(TimeRange::trailing(Duration::from_secs(7 * 24 * 3600))?)
        .build()?;

    let portfolios = ["4133", "4134", "4135", "4134"];
    let report = harvester
        .run(portfolios, |source: &SourceId| -> Arc<dyn PageFetcher<Order>> {
            let total = 15 + 7 * u32::try_from(source.as_str().len()).unwrap_or(0);
            Arc::new(SimulatedFeed::new(source.as_str(), total))
        })
        .await;

    for outcome in &report.per_source {
        println!(
            "{:>6}: {} pages, {} records, {} attempts, stopped: {}",
            outcome.source,
            outcome.pages_fetched,
            outcome.records_fetched,
            outcome.attempts,
            outcome.reason
        );
    }
    println!(
        "fetched {} records, {} after merging",
        report.records_fetched(),
        report.merged.len()
    );
    for order in report.merged.values().take(5) {
        println!("{order:?}");
    }
    Ok(())
}
