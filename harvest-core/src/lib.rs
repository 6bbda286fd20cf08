//! harvest-core
//!
//! Contracts shared by the harvest orchestrator, its middleware and adapters.
//!
//! - `page`: page requests, pages, cursors and time windows.
//! - `fetcher`: the `PageFetcher` adapter trait.
//! - `record`: the `Record` trait giving items an identity and a recency.
//! - `merge`: most-recent-wins de-duplication across pages and sources.
//! - `report`: the `RunReport` returned by a run.
//!
//! Adapters are async and assume a Tokio 1.x runtime upstream of them.
#![warn(missing_docs)]

/// The adapter trait implemented by upstream clients.
pub mod fetcher;
/// Record de-duplication.
pub mod merge;
/// Request and response shapes for a single page.
pub mod page;
mod record;
mod report;

pub use fetcher::PageFetcher;
pub use merge::{MergeOutcome, MergedSet, merge};
pub use page::{Cursor, Page, PageRequest, TimeRange};
pub use record::Record;
pub use report::RunReport;

pub use harvest_types::{
    HarvestConfig, HarvestError, PaginationConfig, PaginationMode, RateLimitConfig, RetryConfig,
    SourceId, SourceOutcome, TerminalReason, is_denial_status,
};
