use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the harvest workspace.
///
/// Variants follow the failure taxonomy used by the orchestrator: transient
/// upstream failures (HTTP throttling, server errors, transport problems,
/// attempt timeouts), fatal per-source failures (non-retryable statuses and
/// exhausted retries), and contract violations by adapters.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HarvestError {
    /// The upstream answered with a non-success HTTP status.
    #[error("upstream returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Short excerpt of the response body or reason phrase.
        message: String,
    },

    /// Transport-level failure before any status was received.
    #[error("network error: {0}")]
    Network(String),

    /// A single attempt exceeded its timeout.
    #[error("attempt timed out after {timeout_ms}ms")]
    AttemptTimeout {
        /// Configured per-attempt timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The adapter produced a malformed page.
    #[error("contract violation: {0}")]
    Contract(String),

    /// A retryable failure persisted past the retry ceiling.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made, including the first one.
        attempts: u32,
        /// The failure observed on the final attempt.
        last: Box<HarvestError>,
    },

    /// The run was cancelled or its deadline elapsed.
    #[error("run cancelled")]
    Cancelled,

    /// Invalid input argument or configuration.
    #[error("invalid argument: {0}")]
    InvalidArg(String),
}

impl HarvestError {
    /// Helper: build an `Http` error from a status and message.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Helper: build a `Network` error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Helper: build a `Contract` error.
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Helper: build an `AttemptTimeout` error from the configured timeout.
    #[must_use]
    pub fn attempt_timeout(timeout: Duration) -> Self {
        Self::AttemptTimeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Helper: wrap the last failure of an exhausted retry sequence.
    #[must_use]
    pub fn retries_exhausted(attempts: u32, last: Self) -> Self {
        Self::RetriesExhausted {
            attempts,
            last: Box::new(last),
        }
    }

    /// Whether a fresh attempt may succeed where this one failed.
    ///
    /// Throttling (429), forbidden (403) and server errors (5xx) are retryable,
    /// as are transport failures and attempt timeouts. Every other status and
    /// all contract errors are fatal.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => is_denial_status(*status),
            Self::Network(_) | Self::AttemptTimeout { .. } => true,
            _ => false,
        }
    }

    /// Status to report to the rate limiter as a denial, if this is one.
    #[must_use]
    pub const fn denial_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } if is_denial_status(*status) => Some(*status),
            _ => None,
        }
    }

    /// HTTP status carried by this error, looking through `RetriesExhausted`.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Returns `true` for `Cancelled`.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Statuses that signal upstream pushback: 429, 403 and the 5xx range.
#[must_use]
pub const fn is_denial_status(status: u16) -> bool {
    status == 429 || status == 403 || (status >= 500 && status <= 599)
}
