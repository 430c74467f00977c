//! Bridges registration to the points ledger.

use auth::domain::repository::AccountOpener;
use auth::{AuthError, AuthResult};
use kernel::id::UserId;
use loyalty::LoyaltyError;
use loyalty::domain::repository::BalanceRepository;

/// Opens a zero-balance ledger account for every new user.
#[derive(Clone)]
pub struct LedgerAccounts<R> {
    ledger: R,
}

impl<R> LedgerAccounts<R>
where
    R: BalanceRepository + Clone + Send + Sync + 'static,
{
    pub fn new(ledger: R) -> Self {
        Self { ledger }
    }
}

impl<R> AccountOpener for LedgerAccounts<R>
where
    R: BalanceRepository + Clone + Send + Sync + 'static,
{
    async fn open_account(&self, user_id: &UserId) -> AuthResult<()> {
        self.ledger
            .open_account(user_id)
            .await
            .map_err(|e| match e {
                LoyaltyError::Database(db) => AuthError::Database(db),
                other => AuthError::Internal(format!("opening ledger account: {other}")),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty::domain::entities::Balance;
    use loyalty::infra::memory::InMemoryLedger;

    #[tokio::test]
    async fn opens_a_zero_balance() {
        let ledger = InMemoryLedger::new();
        let accounts = LedgerAccounts::new(ledger.clone());
        let user = UserId::new();

        accounts.open_account(&user).await.unwrap();
        accounts.open_account(&user).await.unwrap();
        assert_eq!(ledger.get_balance(&user).await.unwrap(), Balance::default());
    }
}
