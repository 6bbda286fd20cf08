//! Per-source page walker.

use std::time::Duration;

use harvest_core::{Cursor, PageFetcher, PageRequest, TimeRange};
use harvest_types::{HarvestError, PaginationConfig, PaginationMode, SourceId, TerminalReason};
use tokio_util::sync::CancellationToken;

/// Everything one walk produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Walk<R> {
    /// Source that was walked.
    pub source: SourceId,
    /// Records from every fetched page, in arrival order, duplicates included.
    pub records: Vec<R>,
    /// Pages successfully fetched.
    pub pages_fetched: u32,
    /// Why the walk stopped.
    pub reason: TerminalReason,
    /// Fatal failure, present only when `reason` is `Error`.
    pub error: Option<HarvestError>,
}

/// Drives sequential page fetches for one source until a termination trigger fires.
///
/// Checked after each page, in order:
/// 1. fewer records than `page_size` (including none): `PageShort`
/// 2. accumulated records reached the upstream's reported total: `TotalReached`
/// 3. full page without a cursor: `NoCursor`, or the next page number in
///    `PageNumber` mode
/// 4. the cursor repeats the previous one: one confirmation fetch, then
///    `LoopDetected` if it still does not advance
/// 5. `max_pages` reached: `MaxPages`
///
/// A failed fetch ends the walk with `Error`, keeping the records gathered so far.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    config: PaginationConfig,
    time_range: Option<TimeRange>,
}

enum Step {
    Continue,
    Done(TerminalReason),
}

struct WalkState {
    req: PageRequest,
    last_cursor: Option<Cursor>,
    confirming: bool,
}

impl Paginator {
    /// Walker for the given limits.
    #[must_use]
    pub const fn new(config: PaginationConfig) -> Self {
        Self {
            config,
            time_range: None,
        }
    }

    /// Forward `range` on every request.
    #[must_use]
    pub const fn with_time_range(mut self, range: Option<TimeRange>) -> Self {
        self.time_range = range;
        self
    }

    /// Limits in effect.
    #[must_use]
    pub const fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Walk `source` to completion.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "harvest::paginator::walk",
            skip(self, source, fetcher, cancel),
            fields(source = %source, adapter = fetcher.name()),
        )
    )]
    pub async fn walk<R>(
        &self,
        source: SourceId,
        fetcher: &dyn PageFetcher<R>,
        cancel: &CancellationToken,
    ) -> Walk<R> {
        let mut state = WalkState {
            req: PageRequest::first(source.clone(), self.config.page_size)
                .with_time_range(self.time_range),
            last_cursor: None,
            confirming: false,
        };
        let mut records: Vec<R> = Vec::new();
        let mut pages_fetched: u32 = 0;

        let (reason, error) = 'walk: loop {
            if cancel.is_cancelled() {
                break 'walk (TerminalReason::Error, Some(HarvestError::Cancelled));
            }
            if pages_fetched > 0 && self.config.page_delay_ms > 0 {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        break 'walk (TerminalReason::Error, Some(HarvestError::Cancelled));
                    }
                    () = tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)) => {}
                }
            }

            let page = match fetcher.fetch_page(&state.req).await {
                Ok(page) => page,
                Err(err) => break 'walk (TerminalReason::Error, Some(err)),
            };
            pages_fetched += 1;
            let got = page.records.len();
            records.extend(page.records);

            match self.advance(&mut state, got, records.len(), page.next_cursor, page.total) {
                Step::Continue => {}
                Step::Done(reason) => break 'walk (reason, None),
            }
            if pages_fetched >= self.config.max_pages {
                break 'walk (TerminalReason::MaxPages, None);
            }
            state.req.page = state.req.page.saturating_add(1);
        };

        #[cfg(feature = "tracing")]
        {
            match &error {
                Some(err) => tracing::info!(
                    pages = pages_fetched,
                    records = records.len(),
                    reason = %reason,
                    error = %err,
                    "walk ended on failure"
                ),
                None => tracing::info!(
                    pages = pages_fetched,
                    records = records.len(),
                    reason = %reason,
                    "walk finished"
                ),
            }
        }

        Walk {
            source,
            records,
            pages_fetched,
            reason,
            error,
        }
    }

    /// Apply the termination rules to a freshly fetched page and prepare the next request.
    fn advance(
        &self,
        state: &mut WalkState,
        got: usize,
        accumulated: usize,
        next_cursor: Option<Cursor>,
        total: Option<u64>,
    ) -> Step {
        if got < self.config.page_size as usize {
            return Step::Done(TerminalReason::PageShort);
        }
        if let Some(total) = total
            && total > 0
            && accumulated as u64 >= total
        {
            return Step::Done(TerminalReason::TotalReached);
        }

        let Some(next) = next_cursor else {
            return match self.config.mode {
                PaginationMode::PageNumber => {
                    state.req.cursor = None;
                    state.last_cursor = None;
                    state.confirming = false;
                    Step::Continue
                }
                _ if state.confirming => Step::Done(TerminalReason::LoopDetected),
                _ => Step::Done(TerminalReason::NoCursor),
            };
        };

        if state.last_cursor.as_ref() == Some(&next) {
            if state.confirming {
                #[cfg(feature = "tracing")]
                tracing::warn!(cursor = %next, "upstream keeps echoing the same cursor");
                return Step::Done(TerminalReason::LoopDetected);
            }
            state.confirming = true;
        } else {
            state.confirming = false;
        }
        state.req.cursor = Some(next.clone());
        state.last_cursor = Some(next);
        Step::Continue
    }
}
