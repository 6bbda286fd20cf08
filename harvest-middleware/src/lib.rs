//! harvest-middleware
//!
//! Attempt governance wrapped around raw page fetchers:
//!
//! - `RateLimiter`: adaptive token bucket shared across every walk of a run.
//! - `RetryPolicy`: classifies failures and computes geometric backoff.
//! - `GovernedFetcher`: admission, per-attempt timeout, retries and
//!   cancellation around one adapter fetcher.
#![warn(missing_docs)]

mod attempt;
/// Jitter and geometric delay helpers.
pub mod backoff;
mod governed;
mod limiter;
mod retry;

pub use crate::attempt::{Attempt, AttemptStatus};
pub use crate::governed::GovernedFetcher;
pub use crate::limiter::{LimiterSnapshot, Outcome, RateLimiter};
pub use crate::retry::{RetryDecision, RetryPolicy};
