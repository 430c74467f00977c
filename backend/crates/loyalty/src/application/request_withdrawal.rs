//! Request Withdrawal Use Case
//!
//! Spends points from the user's balance against an order number.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entities::{Balance, Withdrawal};
use crate::domain::repository::BalanceRepository;
use crate::domain::value_objects::{Amount, OrderNumber};
use crate::error::{LoyaltyError, LoyaltyResult};

/// Request withdrawal input
pub struct RequestWithdrawalInput {
    pub user_id: UserId,
    pub order: String,
    pub sum: Amount,
}

/// Request withdrawal use case
pub struct RequestWithdrawalUseCase<R>
where
    R: BalanceRepository,
{
    repo: Arc<R>,
}

impl<R> RequestWithdrawalUseCase<R>
where
    R: BalanceRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Returns the balance after the debit.
    pub async fn execute(&self, input: RequestWithdrawalInput) -> LoyaltyResult<Balance> {
        let order_number = OrderNumber::parse(&input.order)?;
        if !input.sum.is_positive() {
            return Err(LoyaltyError::InvalidAmount);
        }

        let withdrawal = Withdrawal::new(input.user_id, order_number, input.sum);
        let balance = self.repo.debit(&withdrawal).await?;

        tracing::info!(
            user_id = %withdrawal.user_id,
            order = %withdrawal.order_number,
            sum = %withdrawal.sum,
            current = %balance.current,
            "Points withdrawn"
        );

        Ok(balance)
    }
}
