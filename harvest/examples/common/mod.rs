use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use harvest::{HarvestError, Page, PageFetcher, PageRequest, Record};

/// A copy-trading order as an adapter would normalize it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub portfolio: String,
    pub symbol: &'static str,
    pub side: &'static str,
    pub opened_at: i64,
    pub updated_at: i64,
}

impl Record for Order {
    type Key = (String, &'static str, &'static str, i64);

    fn identity_key(&self) -> Self::Key {
        (self.portfolio.clone(), self.symbol, self.side, self.opened_at)
    }

    fn recency(&self) -> i64 {
        self.updated_at
    }
}

const SYMBOLS: [&str; 3] = ["BTCUSDT", "ETHUSDT", "SOLUSDT"];

/// In-process stand-in for a lead-portfolio order history endpoint.
///
/// Serves `total` orders newest first using a `pageTime`-style cursor. Each
/// page repeats the last order of the previous one with a later update time,
/// as real endpoints do when orders change between requests. Every
/// `deny_every`-th call answers 429.
pub struct SimulatedFeed {
    portfolio: String,
    total: u32,
    deny_every: Option<u32>,
    latency: Duration,
    calls: AtomicU32,
}

impl SimulatedFeed {
    pub fn new(portfolio: &str, total: u32) -> Self {
        Self {
            portfolio: portfolio.to_string(),
            total,
            deny_every: None,
            latency: Duration::from_millis(20),
            calls: AtomicU32::new(0),
        }
    }

    pub const fn deny_every(mut self, n: u32) -> Self {
        self.deny_every = Some(n);
        self
    }

    fn order(&self, idx: u32, revision: i64) -> Order {
        let opened_at = 1_760_000_000_000 - i64::from(idx) * 60_000;
        Order {
            portfolio: self.portfolio.clone(),
            symbol: SYMBOLS[idx as usize % SYMBOLS.len()],
            side: if idx % 2 == 0 { "LONG" } else { "SHORT" },
            opened_at,
            updated_at: opened_at + revision,
        }
    }
}

#[async_trait]
impl PageFetcher<Order> for SimulatedFeed {
    async fn fetch_page(&self, req: &PageRequest) -> Result<Page<Order>, HarvestError> {
        tokio::time::sleep(self.latency).await;
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(n) = self.deny_every
            && call % n == 0
        {
            return Err(HarvestError::http(429, "Too many requests"));
        }

        let start = req
            .cursor
            .as_ref()
            .map(|c| c.as_str().parse::<u32>())
            .transpose()
            .map_err(|e| HarvestError::contract(format!("bad cursor: {e}")))?
            .unwrap_or(0);
        let mut records = Vec::new();
        if start > 0 {
            records.push(self.order(start - 1, 5_000));
        }
        let room = req.page_size.saturating_sub(1).max(1);
        let room = if start > 0 { room } else { req.page_size };
        let end = (start + room).min(self.total);
        records.extend((start..end).map(|i| self.order(i, 1)));
        let mut page = Page::new(records).with_total(u64::from(self.total));
        if end < self.total {
            page = page.with_next_cursor(u64::from(end));
        }
        Ok(page)
    }

    fn name(&self) -> &'static str {
        "simulated-feed"
    }
}
