mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Order, SimulatedFeed};
use harvest::{
    HarvestError, Harvester, PageFetcher, PageRequest, RateLimitConfig, RateLimiter, RetryConfig,
    SourceId,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=debug cargo run --example throttled_harvest --features tracing
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();

    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        capacity: 8,
        min_capacity: 2,
        ..RateLimitConfig::default()
    }));
    let harvester = Harvester::builder()
        .concurrency(3)
        .page_size(20)
        .max_pages(4)
        .retry(RetryConfig {
            max_retries: 2,
            ..RetryConfig::default()
        })
        .run_timeout(Duration::from_secs(30))
        .shared_rate_limiter(Arc::clone(&limiter))
        .build()?;

    let report = harvester
        .run(
            ["lead-a", "lead-b", "lead-c", "deleted"],
            |source: &SourceId| -> Arc<dyn PageFetcher<Order>> {
                match source.as_str() {
                    "deleted" => <dyn PageFetcher<Order>>::from_fn(|_req: &PageRequest| {
                        Err(HarvestError::http(404, "portfolio not found"))
                    }),
                    "lead-b" => Arc::new(SimulatedFeed::new(source.as_str(), 70).deny_every(3)),
                    _ => Arc::new(SimulatedFeed::new(source.as_str(), 50)),
                }
            },
        )
        .await;

    let snap = limiter.snapshot();
    println!("limiter capacity after run: {} (floor {})", snap.capacity, limiter.min_capacity());
    for outcome in &report.per_source {
        match &outcome.error {
            Some(err) => println!("{:>8}: FAILED after {} attempts: {err}", outcome.source, outcome.attempts),
            None => println!(
                "{:>8}: {} pages in {} attempts ({})",
                outcome.source, outcome.pages_fetched, outcome.attempts, outcome.reason
            ),
        }
    }
    println!(
        "complete: {}, merged records: {}",
        report.is_complete(),
        report.merged.len()
    );
    Ok(())
}
