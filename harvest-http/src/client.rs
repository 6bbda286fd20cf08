use std::time::Duration;

use harvest_core::HarvestError;

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Build a `reqwest::Client` whose requests give up after `timeout`.
///
/// # Errors
/// Returns `InvalidArg` if the TLS backend or system configuration cannot be
/// initialised.
pub fn create_http_client(timeout: Duration) -> Result<reqwest::Client, HarvestError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("harvest-http/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| HarvestError::InvalidArg(format!("failed to build http client: {e}")))
}
