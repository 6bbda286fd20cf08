use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use harvest_core::{HarvestError, Page, PageFetcher, PageRequest};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Step<R> {
    /// Return this page.
    Page(Page<R>),
    /// Fail with this error.
    Fail(HarvestError),
    /// Sleep, then return the page.
    Delayed(Duration, Page<R>),
    /// Never answer.
    Hang,
}

/// Fetcher that replays a fixed script, one step per call.
///
/// Once the script runs out the last step repeats forever, which makes
/// "always fails" and "always echoes the same cursor" upstreams one-liners.
/// Every request is recorded for later inspection.
pub struct ScriptedFetcher<R> {
    steps: Vec<Step<R>>,
    state: Mutex<ScriptState>,
}

#[derive(Default)]
struct ScriptState {
    next: usize,
    requests: Vec<PageRequest>,
}

impl<R> Default for ScriptedFetcher<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ScriptedFetcher<R> {
    /// Empty script; calls fail with a contract error until steps are added.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            state: Mutex::new(ScriptState::default()),
        }
    }

    /// Append a step.
    #[must_use]
    pub fn then(mut self, step: Step<R>) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a page.
    #[must_use]
    pub fn page(self, page: Page<R>) -> Self {
        self.then(Step::Page(page))
    }

    /// Append several pages.
    #[must_use]
    pub fn pages(self, pages: impl IntoIterator<Item = Page<R>>) -> Self {
        pages.into_iter().fold(self, Self::page)
    }

    /// Append a failure.
    #[must_use]
    pub fn fail(self, err: HarvestError) -> Self {
        self.then(Step::Fail(err))
    }

    /// Append an HTTP failure with the given status.
    #[must_use]
    pub fn status(self, status: u16) -> Self {
        self.fail(HarvestError::http(status, format!("scripted {status}")))
    }

    /// Append a call that never completes.
    #[must_use]
    pub fn hang(self) -> Self {
        self.then(Step::Hang)
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<R: Clone> ScriptedFetcher<R> {
    fn next_step(&self, req: &PageRequest) -> Option<Step<R>> {
        let mut st = self.lock();
        st.requests.push(req.clone());
        let idx = st.next.min(self.steps.len().checked_sub(1)?);
        st.next += 1;
        self.steps.get(idx).cloned()
    }
}

#[async_trait]
impl<R> PageFetcher<R> for ScriptedFetcher<R>
where
    R: Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, req: &PageRequest) -> Result<Page<R>, HarvestError> {
        match self.next_step(req) {
            None => Err(HarvestError::contract("empty script")),
            Some(Step::Page(page)) => Ok(page),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Delayed(delay, page)) => {
                tokio::time::sleep(delay).await;
                Ok(page)
            }
            Some(Step::Hang) => std::future::pending().await,
        }
    }

    fn name(&self) -> &'static str {
        "harvest-mock"
    }
}
