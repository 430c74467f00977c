//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{UserId, WithdrawalId};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Amount, OrderNumber};

/// Order lifecycle: `NEW -> PROCESSING -> {INVALID | PROCESSED}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Processed => "PROCESSED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NEW" => Some(OrderStatus::New),
            "PROCESSING" => Some(OrderStatus::Processing),
            "INVALID" => Some(OrderStatus::Invalid),
            "PROCESSED" => Some(OrderStatus::Processed),
            _ => None,
        }
    }

    /// Terminal orders never change status again.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Invalid | OrderStatus::Processed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub number: OrderNumber,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Set only once the order is `PROCESSED`.
    pub accrual: Option<Amount>,
    pub uploaded_at: DateTime<Utc>,
}

impl Order {
    pub fn new(number: OrderNumber, user_id: UserId) -> Self {
        Self {
            number,
            user_id,
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: Utc::now(),
        }
    }
}

/// Final verdict of the accrual system for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalAccrual {
    Invalid,
    Processed { reward: Amount },
}

impl TerminalAccrual {
    pub const fn status(&self) -> OrderStatus {
        match self {
            TerminalAccrual::Invalid => OrderStatus::Invalid,
            TerminalAccrual::Processed { .. } => OrderStatus::Processed,
        }
    }

    pub const fn reward(&self) -> Option<Amount> {
        match self {
            TerminalAccrual::Invalid => None,
            TerminalAccrual::Processed { reward } => Some(*reward),
        }
    }
}

/// What applying a terminal verdict did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualApplication {
    /// The order became terminal; `credited` is zero for `INVALID`.
    Applied { user_id: UserId, credited: Amount },
    /// The order was already terminal (or is unknown); nothing changed.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRegistration {
    Created,
    /// Same user uploaded the same number before; no new row.
    AlreadyRegistered,
}

/// Per-user ledger totals. `current` never goes below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balance {
    pub current: Amount,
    pub withdrawn: Amount,
}

/// Immutable record of points spent against an order number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub user_id: UserId,
    /// Need not reference an uploaded order.
    pub order_number: OrderNumber,
    pub sum: Amount,
    pub processed_at: DateTime<Utc>,
}

impl Withdrawal {
    pub fn new(user_id: UserId, order_number: OrderNumber, sum: Amount) -> Self {
        Self {
            id: WithdrawalId::new(),
            user_id,
            order_number,
            sum,
            processed_at: Utc::now(),
        }
    }
}
