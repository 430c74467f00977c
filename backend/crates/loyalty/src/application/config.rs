//! Application Configuration
//!
//! Settings for the accrual client and the reconciliation poller.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AccrualClientConfig {
    /// Scheme and authority of the accrual system, without trailing slash
    pub base_url: String,
    /// Upper bound for one request, connect included
    pub request_timeout: Duration,
    /// Backoff for a 429 whose `Retry-After` is missing or unparseable
    pub default_retry_after: Duration,
}

impl Default for AccrualClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            request_timeout: Duration::from_secs(5),
            default_retry_after: Duration::from_secs(1),
        }
    }
}

/// `localhost:8080` -> `http://localhost:8080`, trailing slashes dropped.
pub fn normalize_base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Pause between reconciliation cycles, including empty ones
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoyaltyConfig {
    pub accrual: AccrualClientConfig,
    pub poller: PollerConfig,
}
