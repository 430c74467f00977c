//! HTTP client for the accrual system
//!
//! `GET {base}/api/orders/{number}`; every response is classified into an
//! [`AccrualReply`] or an [`AccrualError`]. No retries happen here.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::application::config::AccrualClientConfig;
use crate::domain::accrual::{AccrualError, AccrualReply, AccrualReport, AccrualSource};
use crate::domain::value_objects::{Amount, OrderNumber};

#[derive(Clone)]
pub struct HttpAccrualClient {
    client: reqwest::Client,
    base_url: String,
    default_retry_after: Duration,
}

impl HttpAccrualClient {
    pub fn new(config: &AccrualClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_retry_after: config.default_retry_after,
        })
    }

    fn order_url(&self, number: &OrderNumber) -> String {
        format!("{}/api/orders/{}", self.base_url, number)
    }
}

/// `Retry-After` as whole milliseconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_millis)
}

impl AccrualSource for HttpAccrualClient {
    async fn fetch(&self, number: &OrderNumber) -> Result<AccrualReply, AccrualError> {
        let response = self
            .client
            .get(self.order_url(number))
            .send()
            .await
            .map_err(|e| AccrualError::Transient(format!("request failed: {e}")))?;

        match response.status() {
            StatusCode::OK => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| AccrualError::Transient(format!("reading body failed: {e}")))?;
                let report: AccrualReport = serde_json::from_slice(&body)
                    .map_err(|e| AccrualError::Transient(format!("malformed body: {e}")))?;
                if report.order != number.as_str() {
                    return Err(AccrualError::Transient(format!(
                        "report is for order {}, asked for {number}",
                        report.order
                    )));
                }
                if report.accrual.is_some_and(|a| a < Amount::ZERO) {
                    return Err(AccrualError::Transient(format!(
                        "negative accrual for order {number}"
                    )));
                }
                Ok(AccrualReply::Scored(report))
            }
            StatusCode::NO_CONTENT => Ok(AccrualReply::NotYetKnown),
            StatusCode::TOO_MANY_REQUESTS => Err(AccrualError::RateLimited {
                retry_after: parse_retry_after(response.headers())
                    .unwrap_or(self.default_retry_after),
            }),
            StatusCode::INTERNAL_SERVER_ERROR => Err(AccrualError::Transient(
                "accrual system returned 500".to_string(),
            )),
            other => Err(AccrualError::Permanent {
                status: other.as_u16(),
            }),
        }
    }
}
