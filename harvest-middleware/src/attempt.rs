use std::time::Duration;

use harvest_types::HarvestError;

/// How one attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    /// A page came back.
    Success,
    /// Failed in a way the retry policy may retry.
    RetryableFailure,
    /// Failed for good.
    FatalFailure,
}

impl AttemptStatus {
    /// Classify the raw result of an upstream call.
    pub const fn of<T>(result: &Result<T, HarvestError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) if e.is_retryable() => Self::RetryableFailure,
            Err(_) => Self::FatalFailure,
        }
    }
}

/// One admitted execution of a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number within its request.
    pub number: u32,
    /// Page index of the request.
    pub page: u32,
    /// Time from requesting admission to the result, admission wait included.
    pub elapsed: Duration,
    /// Result classification.
    pub status: AttemptStatus,
}
