//! Loyalty (Points Ledger) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Order numbers, amounts, ledger entities, repository traits
//! - `application/` - Use cases and the accrual reconciliation poller
//! - `infra/` - PostgreSQL ledger, accrual HTTP client, and an in-memory
//!   ledger behind the `testing` feature
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Order upload with Luhn validation and per-user ownership
//! - Balance and withdrawal history
//! - Background polling of the external accrual system
//!
//! ## Ledger Model
//! - Amounts are fixed-point hundredths, never floats
//! - `current` never goes negative; withdrawals are check-and-spend in one
//!   atomic step
//! - Orders become `INVALID` or `PROCESSED` at most once, and only then
//!   is the reward credited

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use application::config::{AccrualClientConfig, LoyaltyConfig, PollerConfig};
pub use application::poller::AccrualPoller;
pub use error::{LoyaltyError, LoyaltyResult};
pub use infra::accrual_http::HttpAccrualClient;
pub use infra::postgres::PgLedgerRepository;
pub use presentation::router::loyalty_router;

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}
