use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use harvest_core::{Page, PageFetcher, PageRequest};
use harvest_types::HarvestError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::attempt::{Attempt, AttemptStatus};
use crate::limiter::{Outcome, RateLimiter};
use crate::retry::{RetryDecision, RetryPolicy};

/// Wraps a raw adapter fetcher so every call is admitted, timed out, retried
/// and cancellable.
///
/// One instance serves one source's walk; the limiter is shared by all of
/// them. Every suspension point (admission, the upstream call, retry backoff)
/// yields [`HarvestError::Cancelled`] as soon as the token fires.
pub struct GovernedFetcher<R> {
    inner: Arc<dyn PageFetcher<R>>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    cancel: CancellationToken,
    attempts: AtomicU32,
    log: Mutex<Vec<Attempt>>,
}

impl<R: Send + 'static> GovernedFetcher<R> {
    /// Wrap `inner`.
    pub fn new(
        inner: Arc<dyn PageFetcher<R>>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        attempt_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner,
            limiter,
            retry,
            attempt_timeout,
            cancel,
            attempts: AtomicU32::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Upstream attempts made so far, retries included.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Every attempt made so far, in order.
    pub fn attempt_log(&self) -> Vec<Attempt> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, attempt: Attempt) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(attempt);
    }

    async fn call_once(&self, req: &PageRequest) -> Result<Page<R>, HarvestError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(HarvestError::Cancelled),
            () = self.limiter.admit() => {}
        }
        self.attempts.fetch_add(1, Ordering::Relaxed);
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(HarvestError::Cancelled),
            res = tokio::time::timeout(self.attempt_timeout, self.inner.fetch_page(req)) => {
                res.unwrap_or_else(|_| Err(HarvestError::attempt_timeout(self.attempt_timeout)))
            }
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "harvest::middleware::governed_fetch",
            skip(self, req),
            fields(
                adapter = self.inner.name(),
                source = %req.source,
                page = req.page,
            ),
        )
    )]
    async fn governed_fetch(&self, req: &PageRequest) -> Result<Page<R>, HarvestError> {
        let mut number: u32 = 0;
        loop {
            number += 1;
            let started = Instant::now();
            let result = self.call_once(req).await;
            if matches!(result, Err(HarvestError::Cancelled)) {
                return result;
            }
            self.record(Attempt {
                number,
                page: req.page,
                elapsed: started.elapsed(),
                status: AttemptStatus::of(&result),
            });

            let err = match result {
                Ok(page) => {
                    self.limiter.report(Outcome::Success);
                    return Ok(page);
                }
                Err(err) => err,
            };
            if let Some(status) = err.denial_status() {
                self.limiter.report(Outcome::Denied {
                    status,
                    attempt: number - 1,
                });
            }
            match self.retry.classify(number, &err) {
                RetryDecision::GiveUp => {
                    return Err(if err.is_retryable() {
                        HarvestError::retries_exhausted(number, err)
                    } else {
                        err
                    });
                }
                RetryDecision::Retry { delay } => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        attempt = number,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "retrying page request"
                    );
                    tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => return Err(HarvestError::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<R: Send + 'static> PageFetcher<R> for GovernedFetcher<R> {
    async fn fetch_page(&self, req: &PageRequest) -> Result<Page<R>, HarvestError> {
        self.governed_fetch(req).await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
