//! Accrual reconciliation poller
//!
//! A single background task that repeatedly lists outstanding orders, asks
//! the accrual system about each of them in turn and applies terminal
//! verdicts to the ledger.
//!
//! Rate limiting is handled as backoff-and-requeue: the rate-limited order
//! goes back to the front of the cycle's queue and the task sleeps for the
//! requested delay, so the rest of the batch waits behind it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::config::PollerConfig;
use crate::domain::accrual::{AccrualError, AccrualReply, AccrualSource};
use crate::domain::entities::{AccrualApplication, Order, TerminalAccrual};
use crate::domain::repository::{BalanceRepository, OrderRepository};
use crate::error::LoyaltyResult;

/// Outcome of asking about one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The order is terminal now (or already was).
    Settled,
    /// Left untouched; it stays eligible for the next cycle.
    Pending,
    /// Retry the same order once the delay has elapsed.
    Backoff(Duration),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub listed: usize,
    pub settled: usize,
    pub pending: usize,
    pub backoffs: usize,
    /// Shutdown was requested before the queue drained.
    pub interrupted: bool,
}

pub struct AccrualPoller<R, A>
where
    R: OrderRepository + BalanceRepository + Send + Sync + 'static,
    A: AccrualSource + Send + Sync + 'static,
{
    repo: Arc<R>,
    accrual: Arc<A>,
    config: PollerConfig,
}

/// Sleep for `delay` unless shutdown comes first. Returns `true` on
/// shutdown; a dropped sender counts as shutdown.
async fn sleep_or_shutdown(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = shutdown.wait_for(|stop| *stop) => true,
    }
}

impl<R, A> AccrualPoller<R, A>
where
    R: OrderRepository + BalanceRepository + Send + Sync + 'static,
    A: AccrualSource + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, accrual: Arc<A>, config: PollerConfig) -> Self {
        Self {
            repo,
            accrual,
            config,
        }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Cycle until shutdown. A failed cycle is logged and retried after the
    /// usual interval; nothing here terminates the loop except shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "Accrual poller started"
        );

        while !*shutdown.borrow() {
            match self.run_cycle(&mut shutdown).await {
                Ok(report) => {
                    tracing::debug!(
                        listed = report.listed,
                        settled = report.settled,
                        pending = report.pending,
                        backoffs = report.backoffs,
                        "Reconciliation cycle finished"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not list outstanding orders, skipping cycle");
                }
            }

            if sleep_or_shutdown(&mut shutdown, self.config.poll_interval).await {
                break;
            }
        }

        tracing::info!("Accrual poller stopped");
    }

    /// One pass over every outstanding order. Only listing can fail;
    /// per-order failures are contained in the returned report.
    pub async fn run_cycle(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> LoyaltyResult<CycleReport> {
        let outstanding = self.repo.list_outstanding_orders().await?;
        let mut report = CycleReport {
            listed: outstanding.len(),
            ..Default::default()
        };
        tracing::debug!(outstanding = report.listed, "Reconciliation cycle started");

        let mut queue: VecDeque<Order> = outstanding.into();
        while let Some(order) = queue.pop_front() {
            if *shutdown.borrow() {
                report.interrupted = true;
                break;
            }

            match self.reconcile(&order).await {
                Reconciliation::Settled => report.settled += 1,
                Reconciliation::Pending => report.pending += 1,
                Reconciliation::Backoff(delay) => {
                    report.backoffs += 1;
                    queue.push_front(order);
                    if sleep_or_shutdown(shutdown, delay).await {
                        report.interrupted = true;
                        break;
                    }
                }
            }
        }

        Ok(report)
    }

    pub async fn reconcile(&self, order: &Order) -> Reconciliation {
        let number = &order.number;

        match self.accrual.fetch(number).await {
            Ok(AccrualReply::Scored(report)) => match report.terminal() {
                Some(result) => self.settle(order, result).await,
                None => {
                    tracing::debug!(order = %number, status = ?report.status, "Order is still being scored");
                    Reconciliation::Pending
                }
            },
            Ok(AccrualReply::NotYetKnown) => {
                tracing::debug!(order = %number, "Order not registered by the accrual system yet");
                Reconciliation::Pending
            }
            Err(AccrualError::RateLimited { retry_after }) => {
                tracing::warn!(
                    order = %number,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Accrual system is rate limiting, backing off"
                );
                Reconciliation::Backoff(retry_after)
            }
            Err(e @ AccrualError::Transient(_)) => {
                tracing::warn!(order = %number, error = %e, "Transient accrual failure, retrying next cycle");
                Reconciliation::Pending
            }
            Err(e @ AccrualError::Permanent { .. }) => {
                tracing::warn!(order = %number, error = %e, "Unexpected accrual response, retrying next cycle");
                Reconciliation::Pending
            }
        }
    }

    async fn settle(&self, order: &Order, result: TerminalAccrual) -> Reconciliation {
        match self.repo.apply_accrual_result(&order.number, result).await {
            Ok(AccrualApplication::Applied { user_id, credited }) => {
                tracing::info!(
                    order = %order.number,
                    user_id = %user_id,
                    status = result.status().as_str(),
                    credited = %credited,
                    "Accrual applied"
                );
                Reconciliation::Settled
            }
            Ok(AccrualApplication::Unchanged) => {
                tracing::debug!(order = %order.number, "Order was already settled");
                Reconciliation::Settled
            }
            Err(e) => {
                tracing::warn!(order = %order.number, error = %e, "Failed to apply accrual result, retrying next cycle");
                Reconciliation::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::accrual::AccrualStatus;
    use crate::domain::entities::OrderStatus;
    use crate::domain::repository::{BalanceRepository, OrderRepository};
    use crate::domain::value_objects::{Amount, OrderNumber};
    use crate::infra::memory::InMemoryLedger;
    use crate::testing::{FlakyLedger, ScriptedAccrual, processed, scored};
    use kernel::id::UserId;

    fn poller<R>(repo: Arc<R>, accrual: Arc<ScriptedAccrual>) -> AccrualPoller<R, ScriptedAccrual>
    where
        R: OrderRepository + BalanceRepository + Send + Sync + 'static,
    {
        AccrualPoller::new(
            repo,
            accrual,
            PollerConfig {
                poll_interval: Duration::from_millis(20),
            },
        )
    }

    async fn seed(ledger: &InMemoryLedger, user: UserId, raw: &str) -> OrderNumber {
        let number = OrderNumber::parse(raw).unwrap();
        ledger.register_order(&user, &number).await.unwrap();
        number
    }

    #[tokio::test]
    async fn processed_order_is_credited_and_leaves_the_queue() {
        let ledger = Arc::new(InMemoryLedger::new());
        let user = UserId::new();
        let number = seed(&ledger, user, "12345678903").await;
        let accrual = Arc::new(ScriptedAccrual::new());
        accrual.push(&number, processed(&number, 729.98));

        let (_tx, mut rx) = watch::channel(false);
        let report = poller(ledger.clone(), accrual).run_cycle(&mut rx).await.unwrap();

        assert_eq!(report.settled, 1);
        let order = ledger.find_order(&number).await.unwrap();
        assert_eq!(order.status, OrderStatus::Processed);
        assert_eq!(order.accrual, Some(Amount::from_minor(72_998)));
        assert_eq!(
            ledger.get_balance(&user).await.unwrap().current,
            Amount::from_minor(72_998)
        );
        assert!(ledger.list_outstanding_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_order_is_terminal_without_credit() {
        let ledger = Arc::new(InMemoryLedger::new());
        let user = UserId::new();
        let number = seed(&ledger, user, "18").await;
        let accrual = Arc::new(ScriptedAccrual::new());
        accrual.push(&number, scored(&number, AccrualStatus::Invalid, None));

        let (_tx, mut rx) = watch::channel(false);
        poller(ledger.clone(), accrual).run_cycle(&mut rx).await.unwrap();

        let order = ledger.find_order(&number).await.unwrap();
        assert_eq!(order.status, OrderStatus::Invalid);
        assert_eq!(order.accrual, None);
        assert_eq!(ledger.get_balance(&user).await.unwrap().current, Amount::ZERO);
    }

    #[tokio::test]
    async fn non_terminal_answers_leave_orders_untouched() {
        let ledger = Arc::new(InMemoryLedger::new());
        let user = UserId::new();
        let registered = seed(&ledger, user, "18").await;
        let processing = seed(&ledger, user, "26").await;
        let unknown = seed(&ledger, user, "34").await;
        let transient = seed(&ledger, user, "42").await;
        let permanent = seed(&ledger, user, "59").await;

        let accrual = Arc::new(ScriptedAccrual::new());
        accrual.push(&registered, scored(&registered, AccrualStatus::Registered, None));
        accrual.push(&processing, scored(&processing, AccrualStatus::Processing, None));
        accrual.push(&unknown, Ok(AccrualReply::NotYetKnown));
        accrual.push(&transient, Err(AccrualError::Transient("500".into())));
        accrual.push(&permanent, Err(AccrualError::Permanent { status: 404 }));

        let (_tx, mut rx) = watch::channel(false);
        let report = poller(ledger.clone(), accrual).run_cycle(&mut rx).await.unwrap();

        assert_eq!(report.listed, 5);
        assert_eq!(report.pending, 5);
        assert_eq!(report.settled, 0);
        for order in ledger.list_outstanding_orders().await.unwrap() {
            assert_eq!(order.status, OrderStatus::New);
        }
        assert_eq!(ledger.list_outstanding_orders().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn rate_limited_order_is_retried_before_the_next_one() {
        let ledger = Arc::new(InMemoryLedger::new());
        let user = UserId::new();
        let first = seed(&ledger, user, "18").await;
        let second = seed(&ledger, user, "26").await;

        let accrual = Arc::new(ScriptedAccrual::new());
        accrual.push(
            &first,
            Err(AccrualError::RateLimited {
                retry_after: Duration::from_millis(10),
            }),
        );
        accrual.push(&first, processed(&first, 5.0));
        accrual.push(&second, processed(&second, 7.0));

        let (_tx, mut rx) = watch::channel(false);
        let report = poller(ledger.clone(), accrual.clone())
            .run_cycle(&mut rx)
            .await
            .unwrap();

        assert_eq!(report.backoffs, 1);
        assert_eq!(report.settled, 2);
        assert_eq!(accrual.call_order(), ["18", "18", "26"]);
        assert_eq!(
            ledger.get_balance(&user).await.unwrap().current,
            Amount::from_minor(1_200)
        );
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_long_backoff() {
        let ledger = Arc::new(InMemoryLedger::new());
        let number = seed(&ledger, UserId::new(), "18").await;
        let accrual = Arc::new(ScriptedAccrual::new());
        accrual.push(
            &number,
            Err(AccrualError::RateLimited {
                retry_after: Duration::from_secs(3600),
            }),
        );

        let (tx, mut rx) = watch::channel(false);
        let poller = poller(ledger, accrual);
        let cycle = tokio::spawn(async move { poller.run_cycle(&mut rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let report = tokio::time::timeout(Duration::from_secs(1), cycle)
            .await
            .expect("cycle should stop promptly")
            .unwrap()
            .unwrap();
        assert!(report.interrupted);
        assert_eq!(report.settled, 0);
    }

    #[tokio::test]
    async fn listing_failure_skips_the_cycle_but_not_the_loop() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();
        let number = seed(&ledger, user, "18").await;
        let flaky = Arc::new(FlakyLedger::failing_lists(ledger.clone(), 2));
        let accrual = Arc::new(ScriptedAccrual::new());
        accrual.push(&number, processed(&number, 1.0));

        let (tx, rx) = watch::channel(false);
        let handle = poller(flaky.clone(), accrual).spawn(rx);

        tokio::time::timeout(Duration::from_secs(2), async {
            while ledger.get_balance(&user).await.unwrap().current == Amount::ZERO {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("order should eventually be credited");

        assert!(flaky.list_calls() >= 3);
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("poller should stop")
            .unwrap();
    }

    #[tokio::test]
    async fn empty_ledger_does_not_busy_loop() {
        let flaky = Arc::new(FlakyLedger::failing_lists(InMemoryLedger::new(), 0));
        let accrual = Arc::new(ScriptedAccrual::new());

        let (tx, rx) = watch::channel(false);
        let handle = poller(flaky.clone(), accrual).spawn(rx);
        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        // 20ms interval over 200ms, with generous slack for slow runners
        let calls = flaky.list_calls();
        assert!((1..=15).contains(&calls), "listed {calls} times");
    }

    #[tokio::test]
    async fn dropped_shutdown_sender_stops_the_poller() {
        let accrual = Arc::new(ScriptedAccrual::new());
        let (tx, rx) = watch::channel(false);
        let handle = poller(Arc::new(InMemoryLedger::new()), accrual).spawn(rx);
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("poller should stop when its shutdown sender is gone")
            .unwrap();
    }
}
