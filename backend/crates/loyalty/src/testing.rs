//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use kernel::id::UserId;

use crate::domain::accrual::{
    AccrualError, AccrualReply, AccrualReport, AccrualSource, AccrualStatus,
};
use crate::domain::entities::{
    AccrualApplication, Balance, Order, OrderRegistration, TerminalAccrual, Withdrawal,
};
use crate::domain::repository::{BalanceRepository, OrderRepository};
use crate::domain::value_objects::{Amount, OrderNumber};
use crate::error::{LoyaltyError, LoyaltyResult};
use crate::infra::memory::InMemoryLedger;

pub type Scripted = Result<AccrualReply, AccrualError>;

pub fn scored(number: &OrderNumber, status: AccrualStatus, accrual: Option<f64>) -> Scripted {
    Ok(AccrualReply::Scored(AccrualReport {
        order: number.to_string(),
        status,
        accrual: accrual.and_then(Amount::from_f64),
    }))
}

pub fn processed(number: &OrderNumber, accrual: f64) -> Scripted {
    scored(number, AccrualStatus::Processed, Some(accrual))
}

/// Answers from a per-order script; an exhausted script answers 204.
#[derive(Default)]
pub struct ScriptedAccrual {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedAccrual {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, number: &OrderNumber, reply: Scripted) {
        self.script
            .lock()
            .unwrap()
            .entry(number.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn call_order(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(number, _)| number.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

impl AccrualSource for ScriptedAccrual {
    async fn fetch(&self, number: &OrderNumber) -> Result<AccrualReply, AccrualError> {
        self.calls
            .lock()
            .unwrap()
            .push((number.to_string(), Instant::now()));
        self.script
            .lock()
            .unwrap()
            .get_mut(number.as_str())
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(AccrualReply::NotYetKnown))
    }
}

/// In-memory ledger whose first `failures` listings fail.
pub struct FlakyLedger {
    inner: InMemoryLedger,
    failures_left: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FlakyLedger {
    pub fn failing_lists(inner: InMemoryLedger, failures: usize) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(failures),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl OrderRepository for FlakyLedger {
    async fn register_order(
        &self,
        user_id: &UserId,
        number: &OrderNumber,
    ) -> LoyaltyResult<OrderRegistration> {
        self.inner.register_order(user_id, number).await
    }

    async fn list_orders(&self, user_id: &UserId) -> LoyaltyResult<Vec<Order>> {
        self.inner.list_orders(user_id).await
    }

    async fn list_outstanding_orders(&self) -> LoyaltyResult<Vec<Order>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LoyaltyError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.list_outstanding_orders().await
    }
}

impl BalanceRepository for FlakyLedger {
    async fn open_account(&self, user_id: &UserId) -> LoyaltyResult<()> {
        self.inner.open_account(user_id).await
    }

    async fn get_balance(&self, user_id: &UserId) -> LoyaltyResult<Balance> {
        self.inner.get_balance(user_id).await
    }

    async fn apply_accrual_result(
        &self,
        number: &OrderNumber,
        result: TerminalAccrual,
    ) -> LoyaltyResult<AccrualApplication> {
        self.inner.apply_accrual_result(number, result).await
    }

    async fn debit(&self, withdrawal: &Withdrawal) -> LoyaltyResult<Balance> {
        self.inner.debit(withdrawal).await
    }

    async fn list_withdrawals(&self, user_id: &UserId) -> LoyaltyResult<Vec<Withdrawal>> {
        self.inner.list_withdrawals(user_id).await
    }
}
