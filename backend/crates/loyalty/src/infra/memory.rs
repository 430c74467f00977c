//! In-memory ledger
//!
//! Same contract as the PostgreSQL store. Every operation runs under one
//! mutex, which serializes all balance updates.

use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::UserId;
use tokio::sync::Mutex;

use crate::domain::entities::{
    AccrualApplication, Balance, Order, OrderRegistration, TerminalAccrual, Withdrawal,
};
use crate::domain::repository::{BalanceRepository, OrderRepository};
use crate::domain::value_objects::OrderNumber;
use crate::error::{LoyaltyError, LoyaltyResult};

#[derive(Default)]
struct LedgerState {
    /// Insertion order doubles as upload order.
    orders: Vec<Order>,
    order_index: HashMap<OrderNumber, usize>,
    balances: HashMap<UserId, Balance>,
    withdrawals: Vec<Withdrawal>,
}

#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a single order, mainly for assertions.
    pub async fn find_order(&self, number: &OrderNumber) -> Option<Order> {
        let state = self.state.lock().await;
        state
            .order_index
            .get(number)
            .map(|&idx| state.orders[idx].clone())
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    pub async fn account_count(&self) -> usize {
        self.state.lock().await.balances.len()
    }
}

impl OrderRepository for InMemoryLedger {
    async fn register_order(
        &self,
        user_id: &UserId,
        number: &OrderNumber,
    ) -> LoyaltyResult<OrderRegistration> {
        let mut state = self.state.lock().await;

        if let Some(&idx) = state.order_index.get(number) {
            return if state.orders[idx].user_id == *user_id {
                Ok(OrderRegistration::AlreadyRegistered)
            } else {
                Err(LoyaltyError::OrderOwnedByAnotherUser(number.to_string()))
            };
        }

        let idx = state.orders.len();
        state.orders.push(Order::new(number.clone(), *user_id));
        state.order_index.insert(number.clone(), idx);
        Ok(OrderRegistration::Created)
    }

    async fn list_orders(&self, user_id: &UserId) -> LoyaltyResult<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|order| order.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn list_outstanding_orders(&self) -> LoyaltyResult<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|order| !order.status.is_terminal())
            .cloned()
            .collect())
    }
}

impl BalanceRepository for InMemoryLedger {
    async fn open_account(&self, user_id: &UserId) -> LoyaltyResult<()> {
        self.state
            .lock()
            .await
            .balances
            .entry(*user_id)
            .or_default();
        Ok(())
    }

    async fn get_balance(&self, user_id: &UserId) -> LoyaltyResult<Balance> {
        let state = self.state.lock().await;
        Ok(state.balances.get(user_id).copied().unwrap_or_default())
    }

    async fn apply_accrual_result(
        &self,
        number: &OrderNumber,
        result: TerminalAccrual,
    ) -> LoyaltyResult<AccrualApplication> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(&idx) = state.order_index.get(number) else {
            return Ok(AccrualApplication::Unchanged);
        };
        let order = &mut state.orders[idx];
        if order.status.is_terminal() {
            return Ok(AccrualApplication::Unchanged);
        }

        // validate the credit before touching anything
        let credited = result.reward().unwrap_or_default();
        let balance = state.balances.entry(order.user_id).or_default();
        let current = balance
            .current
            .checked_add(credited)
            .ok_or_else(|| LoyaltyError::Internal(format!("balance overflow crediting {number}")))?;

        balance.current = current;
        order.status = result.status();
        order.accrual = result.reward();

        Ok(AccrualApplication::Applied {
            user_id: order.user_id,
            credited,
        })
    }

    async fn debit(&self, withdrawal: &Withdrawal) -> LoyaltyResult<Balance> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        // a refused debit leaves no trace, not even an empty account
        let available = state
            .balances
            .get(&withdrawal.user_id)
            .map(|b| b.current)
            .unwrap_or_default();
        if available < withdrawal.sum {
            return Err(LoyaltyError::InsufficientBalance {
                requested: withdrawal.sum,
                available,
            });
        }

        let balance = state.balances.entry(withdrawal.user_id).or_default();
        balance.current -= withdrawal.sum;
        balance.withdrawn += withdrawal.sum;
        let updated = *balance;
        state.withdrawals.push(withdrawal.clone());
        Ok(updated)
    }

    async fn list_withdrawals(&self, user_id: &UserId) -> LoyaltyResult<Vec<Withdrawal>> {
        let state = self.state.lock().await;
        Ok(state
            .withdrawals
            .iter()
            .rev()
            .filter(|w| w.user_id == *user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OrderStatus;
    use crate::domain::value_objects::Amount;

    fn number(raw: &str) -> OrderNumber {
        OrderNumber::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn register_then_list_newest_first() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();
        ledger.register_order(&user, &number("18")).await.unwrap();
        ledger.register_order(&user, &number("12345678903")).await.unwrap();
        ledger.register_order(&UserId::new(), &number("79927398713")).await.unwrap();

        let orders = ledger.list_orders(&user).await.unwrap();
        let numbers: Vec<_> = orders.iter().map(|o| o.number.as_str()).collect();
        assert_eq!(numbers, ["12345678903", "18"]);
    }

    #[tokio::test]
    async fn credit_updates_order_and_balance_together() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();
        let n = number("18");
        ledger.register_order(&user, &n).await.unwrap();

        let applied = ledger
            .apply_accrual_result(&n, TerminalAccrual::Processed { reward: Amount::from_minor(250) })
            .await
            .unwrap();
        assert_eq!(
            applied,
            AccrualApplication::Applied {
                user_id: user,
                credited: Amount::from_minor(250)
            }
        );

        let order = ledger.find_order(&n).await.unwrap();
        assert_eq!(order.status, OrderStatus::Processed);
        assert_eq!(order.accrual, Some(Amount::from_minor(250)));
        assert_eq!(ledger.get_balance(&user).await.unwrap().current, Amount::from_minor(250));
        assert!(ledger.list_outstanding_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_order_is_unchanged() {
        let ledger = InMemoryLedger::new();
        let applied = ledger
            .apply_accrual_result(&number("18"), TerminalAccrual::Invalid)
            .await
            .unwrap();
        assert_eq!(applied, AccrualApplication::Unchanged);
    }

    #[tokio::test]
    async fn missing_account_reads_as_zero_and_rejects_debit() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();
        assert_eq!(ledger.get_balance(&user).await.unwrap(), Balance::default());

        let err = ledger
            .debit(&Withdrawal::new(user, number("18"), Amount::from_minor(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::InsufficientBalance { .. }));
        assert!(ledger.list_withdrawals(&user).await.unwrap().is_empty());
        assert_eq!(ledger.account_count().await, 0);
    }

    #[tokio::test]
    async fn refused_debit_leaves_funded_account_untouched() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();
        let n = number("18");
        ledger.register_order(&user, &n).await.unwrap();
        ledger
            .apply_accrual_result(&n, TerminalAccrual::Processed { reward: Amount::from_minor(300) })
            .await
            .unwrap();

        let err = ledger
            .debit(&Withdrawal::new(user, number("26"), Amount::from_minor(301)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LoyaltyError::InsufficientBalance { available, .. } if available == Amount::from_minor(300)
        ));
        assert_eq!(
            ledger.get_balance(&user).await.unwrap(),
            Balance {
                current: Amount::from_minor(300),
                withdrawn: Amount::ZERO,
            }
        );
        assert_eq!(ledger.account_count().await, 1);
    }

    #[tokio::test]
    async fn open_account_is_idempotent() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();
        ledger.open_account(&user).await.unwrap();
        ledger.open_account(&user).await.unwrap();
        assert_eq!(ledger.get_balance(&user).await.unwrap(), Balance::default());
    }
}
