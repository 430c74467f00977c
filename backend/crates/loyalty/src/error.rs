//! Loyalty Error Types
//!
//! Ledger and order errors that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_objects::{Amount, OrderNumberError};

pub type LoyaltyResult<T> = Result<T, LoyaltyError>;

#[derive(Debug, Error)]
pub enum LoyaltyError {
    /// Request body carried no order number at all
    #[error("Order number is empty")]
    EmptyOrderNumber,

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid order number: {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),

    /// Withdrawal sum is zero or negative
    #[error("Withdrawal sum must be positive")]
    InvalidAmount,

    #[error("Order {0} was uploaded by another user")]
    OrderOwnedByAnotherUser(String),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    /// A stored row could not be mapped back to the domain
    #[error("Corrupt ledger record: {0}")]
    CorruptRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoyaltyError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoyaltyError::EmptyOrderNumber | LoyaltyError::MalformedRequest(_) => {
                ErrorKind::BadRequest
            }
            LoyaltyError::InvalidOrderNumber(_) | LoyaltyError::InvalidAmount => {
                ErrorKind::UnprocessableEntity
            }
            LoyaltyError::OrderOwnedByAnotherUser(_) => ErrorKind::Conflict,
            LoyaltyError::InsufficientBalance { .. } => ErrorKind::PaymentRequired,
            LoyaltyError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_),
            ) => ErrorKind::ServiceUnavailable,
            LoyaltyError::CorruptRecord(_)
            | LoyaltyError::Database(_)
            | LoyaltyError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Server-side failures are reported without their details.
    pub fn to_app_error(&self) -> AppError {
        match self.kind() {
            ErrorKind::ServiceUnavailable => {
                AppError::service_unavailable("Ledger storage is unavailable")
                    .with_action("Retry the request later")
            }
            kind if kind.is_server_error() => AppError::internal("Ledger operation failed"),
            ErrorKind::PaymentRequired => AppError::payment_required(self.to_string())
                .with_action("Wait for uploaded orders to be processed"),
            kind => AppError::new(kind, self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            LoyaltyError::Database(e) => {
                tracing::error!(error = %e, "Ledger database error");
            }
            LoyaltyError::CorruptRecord(msg) | LoyaltyError::Internal(msg) => {
                tracing::error!(message = %msg, "Ledger internal error");
            }
            LoyaltyError::OrderOwnedByAnotherUser(number) => {
                tracing::warn!(order = %number, "Order upload conflicts with another user");
            }
            _ => {
                tracing::debug!(error = %self, "Loyalty request rejected");
            }
        }
    }
}

impl From<LoyaltyError> for AppError {
    fn from(err: LoyaltyError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for LoyaltyError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
