//! Application Layer
//!
//! Use cases and the accrual reconciliation poller.

pub mod config;
pub mod get_balance;
pub mod history;
pub mod poller;
pub mod request_withdrawal;
pub mod submit_order;

// Re-exports
pub use config::{AccrualClientConfig, LoyaltyConfig, PollerConfig};
pub use get_balance::GetBalanceUseCase;
pub use history::{ListOrdersUseCase, ListWithdrawalsUseCase};
pub use poller::{AccrualPoller, CycleReport, Reconciliation};
pub use request_withdrawal::{RequestWithdrawalInput, RequestWithdrawalUseCase};
pub use submit_order::SubmitOrderUseCase;
