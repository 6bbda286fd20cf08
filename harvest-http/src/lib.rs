//! harvest-http
//!
//! A `PageFetcher` that performs exactly one HTTP call per page request.
//!
//! The caller supplies two closures: one that turns a `PageRequest` into a
//! `reqwest::RequestBuilder` (URL, query, headers, signatures) and one that
//! turns the decoded JSON body into a `Page`. This crate only sends the
//! request and maps failures into the `HarvestError` taxonomy:
//!
//! - non-2xx status: `Http { status, message }` with a short body excerpt
//! - client-side timeout: `AttemptTimeout`
//! - any other transport failure: `Network`
//! - a body that is not JSON, or that the decoder rejects: `Contract`
#![warn(missing_docs)]

mod client;
mod fetcher;

pub use client::{DEFAULT_TIMEOUT, create_http_client};
pub use fetcher::{BuildRequest, DecodePage, HttpPageFetcher, excerpt};
