//! Per-source outcome records produced by the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;
use crate::source::SourceId;

/// Why a paginator walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum TerminalReason {
    /// A page returned fewer records than requested (including an empty page).
    PageShort,
    /// A full page arrived without a next cursor under cursor pagination.
    NoCursor,
    /// The upstream kept echoing the same cursor.
    LoopDetected,
    /// The per-source page ceiling was reached.
    MaxPages,
    /// The upstream-reported item total was reached.
    TotalReached,
    /// A fatal failure ended the walk; see the accompanying error.
    Error,
}

impl TerminalReason {
    /// Stable kebab-case label, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageShort => "page-short",
            Self::NoCursor => "no-cursor",
            Self::LoopDetected => "loop-detected",
            Self::MaxPages => "max-pages",
            Self::TotalReached => "total-reached",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one source's walk.
///
/// Carries the page and attempt counts, the terminal reason and, when the walk
/// ended on a fatal failure, the error. Records gathered before a failure are
/// still merged into the run's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOutcome {
    /// The source this outcome describes.
    pub source: SourceId,
    /// Pages successfully fetched.
    pub pages_fetched: u32,
    /// Records received across all fetched pages, before de-duplication.
    pub records_fetched: usize,
    /// Upstream attempts made, retries included.
    pub attempts: u32,
    /// Why the walk stopped.
    pub reason: TerminalReason,
    /// Fatal failure, present only when `reason` is `Error`.
    pub error: Option<HarvestError>,
}

impl SourceOutcome {
    /// Returns `true` when the walk ended on a fatal failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
