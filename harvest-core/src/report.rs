use harvest_types::{SourceId, SourceOutcome};

use crate::merge::MergedSet;
use crate::record::Record;

/// Result of one orchestrated run.
///
/// A run never fails as a whole: per-source failures are reported in
/// `per_source` while records from the successful (and partially successful)
/// walks are merged into `merged`.
#[derive(Debug, Clone)]
pub struct RunReport<R: Record> {
    /// De-duplicated records across all sources.
    pub merged: MergedSet<R>,
    /// One outcome per distinct source, in input order.
    pub per_source: Vec<SourceOutcome>,
}

impl<R: Record> RunReport<R> {
    /// Outcomes that ended on a fatal failure.
    pub fn failures(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.per_source.iter().filter(|o| o.is_failure())
    }

    /// Returns `true` when no source failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Records received across all sources before de-duplication.
    #[must_use]
    pub fn records_fetched(&self) -> usize {
        self.per_source.iter().map(|o| o.records_fetched).sum()
    }

    /// Outcome for one source, if it was part of the run.
    #[must_use]
    pub fn outcome(&self, source: &SourceId) -> Option<&SourceOutcome> {
        self.per_source.iter().find(|o| &o.source == source)
    }
}
