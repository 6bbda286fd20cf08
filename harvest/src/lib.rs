//! Harvest walks paginated, rate-limited upstream APIs for many sources at once
//! and folds the results into one de-duplicated record set.
//!
//! Overview
//! - Adapters implement `harvest_core::PageFetcher`: one upstream call per page
//!   request, mapped into a `Page` or a classified `HarvestError`.
//! - Every attempt is governed: admitted by a shared adaptive `RateLimiter`,
//!   bounded by a per-attempt timeout, retried per `RetryPolicy` and
//!   cancellable at each suspension point.
//! - A `Paginator` walks each source with several termination triggers (short
//!   page, missing cursor, repeated cursor, reported total, page ceiling).
//! - A `WorkerPool` bounds how many sources are walked at once.
//! - Records are merged most-recent-wins by identity key into a `RunReport`.
//!
//! Key behaviors and trade-offs
//! - Rate limiting is shared by every walk of a run, so a denial seen by one
//!   source slows every source hitting that upstream.
//! - Per-source failures never fail the run; partial records are kept and the
//!   failure is reported alongside them.
//! - Merging happens once all walks finish, so there is no shared state
//!   between walks other than the limiter.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use harvest::{Harvester, PageFetcher, SourceId};
//!
//! let harvester = Harvester::builder()
//!     .concurrency(3)
//!     .page_size(10)
//!     .max_pages(5)
//!     .build()?;
//!
//! let report = harvester
//!     .run(["lead-1", "lead-2"], |source: &SourceId| -> Arc<dyn PageFetcher<Order>> {
//!         Arc::new(OrdersFetcher::new(client.clone(), source.clone()))
//!     })
//!     .await;
//!
//! for order in report.merged.values() {
//!     println!("{order:?}");
//! }
//! ```
//!
//! See `harvest/examples/` for runnable demonstrations.
#![warn(missing_docs)]

pub(crate) mod core;
mod paginator;
mod pool;

pub use crate::core::{Harvester, HarvesterBuilder};
pub use crate::paginator::{Paginator, Walk};
pub use crate::pool::WorkerPool;

pub use harvest_core::{
    Cursor, MergeOutcome, MergedSet, Page, PageFetcher, PageRequest, Record, RunReport, TimeRange,
    merge,
};
pub use harvest_middleware::{
    Attempt, AttemptStatus, GovernedFetcher, LimiterSnapshot, Outcome, RateLimiter, RetryDecision,
    RetryPolicy,
};
pub use harvest_types::{
    HarvestConfig, HarvestError, PaginationConfig, PaginationMode, RateLimitConfig, RetryConfig,
    SourceId, SourceOutcome, TerminalReason,
};
