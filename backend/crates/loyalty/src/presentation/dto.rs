//! API DTOs (Data Transfer Objects)
//!
//! Field names follow the public loyalty API, so no case renaming here.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Balance, Order, OrderStatus, Withdrawal};
use crate::domain::value_objects::Amount;

/// RFC 3339 with second precision, e.g. `2020-12-10T15:15:45Z`.
fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ============================================================================
// Orders
// ============================================================================

/// One entry of `GET /api/user/orders`
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub number: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Amount>,
    pub uploaded_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            number: order.number.into_string(),
            status: order.status,
            accrual: order.accrual,
            uploaded_at: rfc3339(order.uploaded_at),
        }
    }
}

// ============================================================================
// Balance
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub current: Amount,
    pub withdrawn: Amount,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        Self {
            current: balance.current,
            withdrawn: balance.withdrawn,
        }
    }
}

// ============================================================================
// Withdrawals
// ============================================================================

/// Body of `POST /api/user/balance/withdraw`
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Amount,
}

/// One entry of `GET /api/user/withdrawals`
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResponse {
    pub order: String,
    pub sum: Amount,
    pub processed_at: String,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(withdrawal: Withdrawal) -> Self {
        Self {
            order: withdrawal.order_number.into_string(),
            sum: withdrawal.sum,
            processed_at: rfc3339(withdrawal.processed_at),
        }
    }
}
