use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use harvest_core::{PageFetcher, Record, RunReport, TimeRange, merge};
use harvest_middleware::{GovernedFetcher, RateLimiter, RetryPolicy};
use harvest_types::{
    HarvestConfig, HarvestError, PaginationConfig, PaginationMode, RateLimitConfig, RetryConfig,
    SourceId, SourceOutcome,
};
use tokio_util::sync::CancellationToken;

use crate::paginator::{Paginator, Walk};
use crate::pool::WorkerPool;

/// Orchestrator that walks many sources against one rate-limited upstream.
#[derive(Debug)]
pub struct Harvester {
    pub(crate) cfg: HarvestConfig,
    pub(crate) time_range: Option<TimeRange>,
    pub(crate) cancel: Option<CancellationToken>,
    pub(crate) limiter: Option<Arc<RateLimiter>>,
}

/// Builder for constructing a `Harvester` with custom configuration.
#[derive(Debug)]
pub struct HarvesterBuilder {
    cfg: HarvestConfig,
    time_range: Option<TimeRange>,
    cancel: Option<CancellationToken>,
    limiter: Option<Arc<RateLimiter>>,
}

impl Default for HarvesterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvesterBuilder {
    /// Create a new builder with the default configuration.
    ///
    /// Defaults: 3 concurrent walks, 15s per attempt, no run deadline, 10 requests
    /// per second shrinking to no less than 2, 3 retries, pages of 50 and at most
    /// 10 pages per source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cfg: HarvestConfig::default(),
            time_range: None,
            cancel: None,
            limiter: None,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: HarvestConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Maximum number of sources walked at the same time.
    #[must_use]
    pub const fn concurrency(mut self, n: usize) -> Self {
        self.cfg.concurrency = n;
        self
    }

    /// Timeout for each individual upstream attempt.
    ///
    /// An attempt that times out counts as a transient failure and is retried.
    #[must_use]
    pub const fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.attempt_timeout = timeout;
        self
    }

    /// Deadline for the whole run.
    ///
    /// When it elapses every in-flight walk is cancelled and queued sources are
    /// reported as cancelled without issuing requests; records already fetched
    /// are kept.
    #[must_use]
    pub const fn run_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.run_timeout = Some(timeout);
        self
    }

    /// Rate limiter settings.
    #[must_use]
    pub fn rate_limit(mut self, cfg: RateLimitConfig) -> Self {
        self.cfg.rate_limit = cfg;
        self
    }

    /// Retry settings.
    #[must_use]
    pub const fn retry(mut self, cfg: RetryConfig) -> Self {
        self.cfg.retry = cfg;
        self
    }

    /// Pagination settings.
    #[must_use]
    pub const fn pagination(mut self, cfg: PaginationConfig) -> Self {
        self.cfg.pagination = cfg;
        self
    }

    /// Records requested per page.
    #[must_use]
    pub const fn page_size(mut self, n: u32) -> Self {
        self.cfg.pagination.page_size = n;
        self
    }

    /// Page ceiling per source.
    #[must_use]
    pub const fn max_pages(mut self, n: u32) -> Self {
        self.cfg.pagination.max_pages = n;
        self
    }

    /// How full pages without a cursor are handled.
    #[must_use]
    pub const fn pagination_mode(mut self, mode: PaginationMode) -> Self {
        self.cfg.pagination.mode = mode;
        self
    }

    /// Pause between consecutive pages of one source.
    #[must_use]
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.cfg.pagination.page_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Time window forwarded on every page request.
    #[must_use]
    pub const fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// External cancellation; each run uses a child of this token.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Share one limiter across runs (or across harvesters hitting the same
    /// upstream). Without it every run starts with a fresh limiter built from
    /// the rate limit settings.
    #[must_use]
    pub fn shared_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Build the `Harvester`.
    ///
    /// # Errors
    /// Returns `InvalidArg` when any configuration section is inconsistent, e.g.
    /// zero concurrency, a zero page size or a capacity floor above the capacity.
    pub fn build(self) -> Result<Harvester, HarvestError> {
        self.cfg.validate()?;
        Ok(Harvester {
            cfg: self.cfg,
            time_range: self.time_range,
            cancel: self.cancel,
            limiter: self.limiter,
        })
    }
}

impl Harvester {
    /// Start building a new `Harvester`.
    ///
    /// ```rust,ignore
    /// use std::time::Duration;
    /// use harvest::{Harvester, TimeRange};
    ///
    /// let harvester = Harvester::builder()
    ///     .concurrency(4)
    ///     .page_size(20)
    ///     .max_pages(5)
    ///     .time_range(TimeRange::trailing(Duration::from_secs(7 * 24 * 3600))?)
    ///     .build()?;
    /// let report = harvester.run(["4133", "4134"], |source| fetcher_for(source)).await;
    /// for failure in report.failures() {
    ///     eprintln!("{}: {:?}", failure.source, failure.error);
    /// }
    /// ```
    #[must_use]
    pub fn builder() -> HarvesterBuilder {
        HarvesterBuilder::new()
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &HarvestConfig {
        &self.cfg
    }

    /// Walk every source and merge what they returned.
    ///
    /// Behavior:
    /// - Duplicate sources are collapsed, keeping the first occurrence.
    /// - Each source gets its own walk with the fetcher from `fetch_page_for`,
    ///   wrapped so every attempt goes through the run's shared rate limiter,
    ///   the retry policy, the attempt timeout and cancellation.
    /// - At most `concurrency` walks are in flight.
    /// - Records from every walk, partial ones included, are merged once all
    ///   walks are done.
    ///
    /// Never fails as a whole: per-source failures are reported in the
    /// returned `RunReport`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "harvest::core::run",
            skip(self, sources, fetch_page_for),
            fields(
                concurrency = self.cfg.concurrency,
                page_size = self.cfg.pagination.page_size,
                max_pages = self.cfg.pagination.max_pages,
            ),
        )
    )]
    pub async fn run<R, I, F>(&self, sources: I, fetch_page_for: F) -> RunReport<R>
    where
        R: Record + Send + 'static,
        I: IntoIterator,
        I::Item: Into<SourceId>,
        F: Fn(&SourceId) -> Arc<dyn PageFetcher<R>>,
    {
        let sources = unique_sources(sources);
        let token = self
            .cancel
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);
        let limiter = self
            .limiter
            .clone()
            .unwrap_or_else(|| Arc::new(RateLimiter::new(self.cfg.rate_limit.clone())));
        let retry = RetryPolicy::new(self.cfg.retry);
        let paginator = Paginator::new(self.cfg.pagination).with_time_range(self.time_range);
        let pool = WorkerPool::new(self.cfg.concurrency);

        #[cfg(feature = "tracing")]
        tracing::info!(sources = sources.len(), "starting harvest run");

        let paginator = &paginator;
        let work = pool.run(sources, |source| {
            let governed = GovernedFetcher::new(
                fetch_page_for(&source),
                Arc::clone(&limiter),
                retry,
                self.cfg.attempt_timeout,
                token.clone(),
            );
            let token = token.clone();
            async move {
                let walk = paginator.walk(source, &governed, &token).await;
                (walk, governed.attempts())
            }
        });

        let walks = match self.cfg.run_timeout {
            Some(deadline) => {
                let finished = CancellationToken::new();
                let watchdog = async {
                    tokio::select! {
                        () = finished.cancelled() => {}
                        () = tokio::time::sleep(deadline) => {
                            #[cfg(feature = "tracing")]
                            tracing::info!(
                                deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                                "run deadline elapsed; cancelling remaining walks"
                            );
                            token.cancel();
                        }
                    }
                };
                let work = async {
                    let walks = work.await;
                    finished.cancel();
                    walks
                };
                let (walks, ()) = tokio::join!(work, watchdog);
                walks
            }
            None => work.await,
        };

        let report = assemble(walks);

        #[cfg(feature = "tracing")]
        tracing::info!(
            merged = report.merged.len(),
            fetched = report.records_fetched(),
            failures = report.failures().count(),
            "harvest run finished"
        );

        report
    }
}

fn unique_sources<I>(sources: I) -> Vec<SourceId>
where
    I: IntoIterator,
    I::Item: Into<SourceId>,
{
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .map(Into::into)
        .filter(|s: &SourceId| seen.insert(s.clone()))
        .collect()
}

fn assemble<R: Record>(walks: Vec<(Walk<R>, u32)>) -> RunReport<R> {
    let mut per_source = Vec::with_capacity(walks.len());
    let mut batches = Vec::with_capacity(walks.len());
    for (walk, attempts) in walks {
        per_source.push(SourceOutcome {
            source: walk.source,
            pages_fetched: walk.pages_fetched,
            records_fetched: walk.records.len(),
            attempts,
            reason: walk.reason,
            error: walk.error,
        });
        batches.push(walk.records);
    }
    RunReport {
        merged: merge(batches),
        per_source,
    }
}
