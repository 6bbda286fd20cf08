//! Bounded-concurrency task runner.

use std::future::Future;

use futures::StreamExt;

/// Runs one task per item with at most `concurrency` tasks in flight.
///
/// Tasks are created lazily as slots free up and run cooperatively on the
/// caller's task; nothing is spawned. Results come back in input order.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    concurrency: usize,
}

impl WorkerPool {
    /// Pool with the given bound; zero is treated as one.
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Maximum tasks in flight.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `task` over every item and collect the results in input order.
    pub async fn run<I, F, Fut>(&self, items: I, mut task: F) -> Vec<Fut::Output>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future,
    {
        let mut indexed: Vec<(usize, Fut::Output)> = futures::stream::iter(
            items.into_iter().enumerate().map(|(idx, item)| {
                let fut = task(item);
                async move { (idx, fut.await) }
            }),
        )
        .buffer_unordered(self.concurrency)
        .collect()
        .await;
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, out)| out).collect()
    }
}
