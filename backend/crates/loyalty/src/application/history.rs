//! History Use Cases
//!
//! Per-user listings of uploaded orders and withdrawals, newest first.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entities::{Order, Withdrawal};
use crate::domain::repository::{BalanceRepository, OrderRepository};
use crate::error::LoyaltyResult;

/// List orders use case
pub struct ListOrdersUseCase<R>
where
    R: OrderRepository,
{
    repo: Arc<R>,
}

impl<R> ListOrdersUseCase<R>
where
    R: OrderRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: &UserId) -> LoyaltyResult<Vec<Order>> {
        self.repo.list_orders(user_id).await
    }
}

/// List withdrawals use case
pub struct ListWithdrawalsUseCase<R>
where
    R: BalanceRepository,
{
    repo: Arc<R>,
}

impl<R> ListWithdrawalsUseCase<R>
where
    R: BalanceRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: &UserId) -> LoyaltyResult<Vec<Withdrawal>> {
        self.repo.list_withdrawals(user_id).await
    }
}
