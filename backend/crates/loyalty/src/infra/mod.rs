//! Infrastructure Layer
//!
//! Ledger stores and the accrual system client.

pub mod accrual_http;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod postgres;

pub use accrual_http::HttpAccrualClient;
#[cfg(any(test, feature = "testing"))]
pub use memory::InMemoryLedger;
pub use postgres::PgLedgerRepository;
