//! Accrual system contract
//!
//! The accrual system scores orders asynchronously. This module holds the
//! normalized view of its answers and the trait the poller drives.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::entities::TerminalAccrual;
use crate::domain::value_objects::{Amount, OrderNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

/// Body of `200 GET /api/orders/{number}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccrualReport {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default)]
    pub accrual: Option<Amount>,
}

impl AccrualReport {
    /// `None` while the accrual system is still working on the order.
    /// A `PROCESSED` report without an amount credits zero.
    pub fn terminal(&self) -> Option<TerminalAccrual> {
        match self.status {
            AccrualStatus::Registered | AccrualStatus::Processing => None,
            AccrualStatus::Invalid => Some(TerminalAccrual::Invalid),
            AccrualStatus::Processed => Some(TerminalAccrual::Processed {
                reward: self.accrual.unwrap_or(Amount::ZERO),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualReply {
    Scored(AccrualReport),
    /// 204: accepted by the accrual system but not scored yet.
    NotYetKnown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccrualError {
    /// No order may be queried before `retry_after` elapses.
    #[error("accrual system is rate limiting, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// 500, malformed body, timeout or connection failure.
    #[error("transient accrual system failure: {0}")]
    Transient(String),

    /// Any other status code.
    #[error("accrual system answered with unexpected status {status}")]
    Permanent { status: u16 },
}

/// One request per call; retry policy belongs to the caller.
#[trait_variant::make(AccrualSource: Send)]
pub trait LocalAccrualSource {
    async fn fetch(&self, number: &OrderNumber) -> Result<AccrualReply, AccrualError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_parses_wire_format() {
        let report: AccrualReport = serde_json::from_str(
            r#"{"order":"12345678903","status":"PROCESSED","accrual":729.98}"#,
        )
        .unwrap();
        assert_eq!(report.order, "12345678903");
        assert_eq!(
            report.terminal(),
            Some(TerminalAccrual::Processed {
                reward: Amount::from_minor(72_998)
            })
        );
    }

    #[test]
    fn report_without_accrual() {
        let report: AccrualReport =
            serde_json::from_str(r#"{"order":"18","status":"REGISTERED"}"#).unwrap();
        assert_eq!(report.accrual, None);
        assert_eq!(report.terminal(), None);

        let invalid: AccrualReport =
            serde_json::from_str(r#"{"order":"18","status":"INVALID"}"#).unwrap();
        assert_eq!(invalid.terminal(), Some(TerminalAccrual::Invalid));
    }

    #[test]
    fn processed_without_amount_credits_zero() {
        let report: AccrualReport =
            serde_json::from_str(r#"{"order":"18","status":"PROCESSED"}"#).unwrap();
        assert_eq!(
            report.terminal(),
            Some(TerminalAccrual::Processed {
                reward: Amount::ZERO
            })
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<AccrualReport>(r#"{"order":"18","status":"DONE"}"#).is_err());
    }
}
