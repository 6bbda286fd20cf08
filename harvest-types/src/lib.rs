//! Harvest-specific data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod config;
mod error;
mod reports;
mod source;

pub use config::{HarvestConfig, PaginationConfig, PaginationMode, RateLimitConfig, RetryConfig};
pub use error::{HarvestError, is_denial_status};
pub use reports::{SourceOutcome, TerminalReason};
pub use source::SourceId;
