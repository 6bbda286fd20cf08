use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use harvest_types::{HarvestError, SourceId};
use serde::{Deserialize, Serialize};

/// Opaque pagination token handed back by the upstream.
///
/// Numeric cursors (e.g. a `pageTime` or `indexValue`) are stored in their
/// decimal string form so equality is textual, the way upstreams echo them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Construct a cursor from any string-like token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for Cursor {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<u64> for Cursor {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// Half-open time window `[start, end)` forwarded with every page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a validated window.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `start` is not strictly before `end`.
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, HarvestError> {
        if start >= end {
            return Err(HarvestError::InvalidArg(format!(
                "time range start {start} must precede end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window of length `window` ending now.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the window is zero or too large to represent.
    pub fn trailing(window: Duration) -> Result<Self, HarvestError> {
        Self::trailing_from(Utc::now(), window)
    }

    /// Window of length `window` ending at `end`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the window is zero or too large to represent.
    pub fn trailing_from(end: DateTime<Utc>, window: Duration) -> Result<Self, HarvestError> {
        let delta = chrono::Duration::from_std(window)
            .map_err(|_| HarvestError::InvalidArg(format!("time window {window:?} too large")))?;
        let start = end
            .checked_sub_signed(delta)
            .ok_or_else(|| HarvestError::InvalidArg(format!("time window {window:?} underflows")))?;
        Self::try_new(start, end)
    }

    /// Inclusive start of the window.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end of the window.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Start as epoch milliseconds, the form most upstream bodies expect.
    #[must_use]
    pub const fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End as epoch milliseconds.
    #[must_use]
    pub const fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

/// Parameters for one page fetch, built by the paginator and consumed by adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Source being paginated.
    pub source: SourceId,
    /// Cursor from the previous page, if the upstream supplied one.
    pub cursor: Option<Cursor>,
    /// 1-based page index; always advances, even under cursor pagination.
    pub page: u32,
    /// Number of records requested.
    pub page_size: u32,
    /// Optional time window filter.
    pub time_range: Option<TimeRange>,
}

impl PageRequest {
    /// Request for the first page of `source`.
    #[must_use]
    pub const fn first(source: SourceId, page_size: u32) -> Self {
        Self {
            source,
            cursor: None,
            page: 1,
            page_size,
            time_range: None,
        }
    }

    /// Attach a time window.
    #[must_use]
    pub const fn with_time_range(mut self, range: Option<TimeRange>) -> Self {
        self.time_range = range;
        self
    }

    /// Returns `true` for the first page (no cursor, page 1).
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.page == 1 && self.cursor.is_none()
    }
}

/// Successful outcome of one fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<R> {
    /// Normalized records in upstream order.
    pub records: Vec<R>,
    /// Cursor for the following page, if any.
    pub next_cursor: Option<Cursor>,
    /// Total item count reported by the upstream, if any.
    pub total: Option<u64>,
}

impl<R> Page<R> {
    /// Page with records and no continuation data.
    #[must_use]
    pub const fn new(records: Vec<R>) -> Self {
        Self {
            records,
            next_cursor: None,
            total: None,
        }
    }

    /// Empty page.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Set the next cursor.
    #[must_use]
    pub fn with_next_cursor(mut self, cursor: impl Into<Cursor>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }

    /// Set the upstream-reported total.
    #[must_use]
    pub const fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Number of records in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the page carries no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
