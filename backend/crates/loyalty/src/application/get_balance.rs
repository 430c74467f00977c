//! Get Balance Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entities::Balance;
use crate::domain::repository::BalanceRepository;
use crate::error::LoyaltyResult;

/// Get balance use case
pub struct GetBalanceUseCase<R>
where
    R: BalanceRepository,
{
    repo: Arc<R>,
}

impl<R> GetBalanceUseCase<R>
where
    R: BalanceRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: &UserId) -> LoyaltyResult<Balance> {
        self.repo.get_balance(user_id).await
    }
}
