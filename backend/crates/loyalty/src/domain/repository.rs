//! Repository Traits
//!
//! The ledger store interface. Implementations live in `infra/`.

use kernel::id::UserId;

use crate::domain::entities::{
    AccrualApplication, Balance, Order, OrderRegistration, TerminalAccrual, Withdrawal,
};
use crate::domain::value_objects::OrderNumber;
use crate::error::LoyaltyResult;

/// Order repository trait
#[trait_variant::make(OrderRepository: Send)]
pub trait LocalOrderRepository {
    /// Insert a `NEW` order, or report that this user already owns it.
    /// Fails with `OrderOwnedByAnotherUser` when someone else does.
    async fn register_order(
        &self,
        user_id: &UserId,
        number: &OrderNumber,
    ) -> LoyaltyResult<OrderRegistration>;

    /// Orders of one user, newest first.
    async fn list_orders(&self, user_id: &UserId) -> LoyaltyResult<Vec<Order>>;

    /// Every order not yet `INVALID` or `PROCESSED`, oldest first.
    async fn list_outstanding_orders(&self) -> LoyaltyResult<Vec<Order>>;
}

/// Balance repository trait
///
/// Every mutation of a user's balance goes through `apply_accrual_result`
/// or `debit`; each is a single atomic unit.
#[trait_variant::make(BalanceRepository: Send)]
pub trait LocalBalanceRepository {
    /// Create the zero ledger for a fresh user. Idempotent.
    async fn open_account(&self, user_id: &UserId) -> LoyaltyResult<()>;

    /// Missing ledgers read as zero.
    async fn get_balance(&self, user_id: &UserId) -> LoyaltyResult<Balance>;

    /// Make the order terminal and, for `PROCESSED`, credit its owner.
    /// Orders that are already terminal are left alone.
    async fn apply_accrual_result(
        &self,
        number: &OrderNumber,
        result: TerminalAccrual,
    ) -> LoyaltyResult<AccrualApplication>;

    /// Check-and-spend against the up-to-date balance, recording the
    /// withdrawal. Returns the balance after the debit.
    async fn debit(&self, withdrawal: &Withdrawal) -> LoyaltyResult<Balance>;

    /// Withdrawals of one user, newest first.
    async fn list_withdrawals(&self, user_id: &UserId) -> LoyaltyResult<Vec<Withdrawal>>;
}
