//! harvest-mock
//!
//! Deterministic page fetchers and fixture records for tests and demos.
#![warn(missing_docs)]

mod fixtures;
mod scripted;

pub use fixtures::{MockRecord, cursor_pages, page_records};
pub use scripted::{ScriptedFetcher, Step};
