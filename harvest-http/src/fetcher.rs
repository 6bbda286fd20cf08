use std::time::Duration;

use async_trait::async_trait;
use harvest_core::{HarvestError, Page, PageFetcher, PageRequest};

use crate::client::DEFAULT_TIMEOUT;

const EXCERPT_CHARS: usize = 160;

/// Turns a page request into a ready-to-send request.
pub type BuildRequest =
    dyn Fn(&reqwest::Client, &PageRequest) -> reqwest::RequestBuilder + Send + Sync;

/// Turns a decoded JSON body into a page.
pub type DecodePage<R> =
    dyn Fn(serde_json::Value, &PageRequest) -> Result<Page<R>, HarvestError> + Send + Sync;

/// First 160 characters of `body`, trimmed; used as the message of HTTP failures.
#[must_use]
pub fn excerpt(body: &str) -> String {
    body.trim().chars().take(EXCERPT_CHARS).collect()
}

/// Adapter that sends one request per page and decodes the JSON answer.
pub struct HttpPageFetcher<R> {
    client: reqwest::Client,
    build: Box<BuildRequest>,
    decode: Box<DecodePage<R>>,
    timeout: Duration,
    name: &'static str,
}

impl<R> HttpPageFetcher<R> {
    /// Fetcher over `client` with the given request builder and decoder.
    pub fn new<B, D>(client: reqwest::Client, build: B, decode: D) -> Self
    where
        B: Fn(&reqwest::Client, &PageRequest) -> reqwest::RequestBuilder + Send + Sync + 'static,
        D: Fn(serde_json::Value, &PageRequest) -> Result<Page<R>, HarvestError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            client,
            build: Box::new(build),
            decode: Box::new(decode),
            timeout: DEFAULT_TIMEOUT,
            name: "harvest-http",
        }
    }

    /// Apply `timeout` to every request; elapsed requests map to `AttemptTimeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Name reported in logs.
    #[must_use]
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    fn transport_error(&self, err: &reqwest::Error) -> HarvestError {
        if err.is_timeout() {
            HarvestError::attempt_timeout(self.timeout)
        } else if err.is_decode() {
            HarvestError::contract(format!("undecodable response body: {err}"))
        } else {
            HarvestError::network(err.to_string())
        }
    }
}

#[async_trait]
impl<R: Send + 'static> PageFetcher<R> for HttpPageFetcher<R> {
    async fn fetch_page(&self, req: &PageRequest) -> Result<Page<R>, HarvestError> {
        let resp = (self.build)(&self.client, req)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(&e))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "harvest::http",
            source = %req.source,
            page = req.page,
            status = status.as_u16(),
            bytes = body.len(),
            "upstream responded"
        );

        if !status.is_success() {
            let mut message = excerpt(&body);
            if message.is_empty() {
                message = status.canonical_reason().unwrap_or("no body").to_string();
            }
            return Err(HarvestError::http(status.as_u16(), message));
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            HarvestError::contract(format!("response is not JSON ({e}): {}", excerpt(&body)))
        })?;
        (self.decode)(value, req)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
