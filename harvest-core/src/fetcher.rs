use std::sync::Arc;

use async_trait::async_trait;
use harvest_types::HarvestError;

use crate::page::{Page, PageRequest};

/// Adapter seam between the orchestrator and one upstream endpoint.
///
/// Implementations perform a single request for the given page and normalize
/// the response. They must not retry, sleep, or rate-limit on their own; the
/// governed wrapper does all of that. Failures are mapped into the shared
/// taxonomy: HTTP statuses become [`HarvestError::Http`], transport problems
/// become [`HarvestError::Network`], and undecodable bodies become
/// [`HarvestError::Contract`].
#[async_trait]
pub trait PageFetcher<R>: Send + Sync {
    /// Fetch one page.
    async fn fetch_page(&self, req: &PageRequest) -> Result<Page<R>, HarvestError>;

    /// Human-readable adapter name used in logs.
    fn name(&self) -> &'static str {
        "anonymous"
    }
}

impl<R: Send + 'static> dyn PageFetcher<R> {
    /// Build a `PageFetcher` from a synchronous closure.
    pub fn from_fn<F>(f: F) -> Arc<dyn PageFetcher<R>>
    where
        F: Fn(&PageRequest) -> Result<Page<R>, HarvestError> + Send + Sync + 'static,
    {
        struct FnFetcher<F>(F);

        #[async_trait]
        impl<R, F> PageFetcher<R> for FnFetcher<F>
        where
            R: Send + 'static,
            F: Fn(&PageRequest) -> Result<Page<R>, HarvestError> + Send + Sync + 'static,
        {
            async fn fetch_page(&self, req: &PageRequest) -> Result<Page<R>, HarvestError> {
                (self.0)(req)
            }

            fn name(&self) -> &'static str {
                "fn"
            }
        }

        Arc::new(FnFetcher(f))
    }
}
