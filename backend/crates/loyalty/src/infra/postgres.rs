//! PostgreSQL Ledger Repository
//!
//! Balance changes run inside a transaction that also touches the order or
//! withdrawal row, and the balance row is only ever updated relative to its
//! current value, so concurrent credits and debits serialize on that row.

use chrono::{DateTime, Utc};
use kernel::id::{UserId, WithdrawalId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{
    AccrualApplication, Balance, Order, OrderRegistration, OrderStatus, TerminalAccrual,
    Withdrawal,
};
use crate::domain::repository::{BalanceRepository, OrderRepository};
use crate::domain::value_objects::{Amount, OrderNumber};
use crate::error::{LoyaltyError, LoyaltyResult};

/// PostgreSQL-backed ledger
#[derive(Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Order Repository Implementation
// ============================================================================

impl OrderRepository for PgLedgerRepository {
    async fn register_order(
        &self,
        user_id: &UserId,
        number: &OrderNumber,
    ) -> LoyaltyResult<OrderRegistration> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (number, user_id, status, uploaded_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (number) DO NOTHING
            "#,
        )
        .bind(number.as_str())
        .bind(user_id.as_uuid())
        .bind(OrderStatus::New.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 1 {
            return Ok(OrderRegistration::Created);
        }

        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM orders WHERE number = $1")
                .bind(number.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match owner {
            Some(owner) if owner == *user_id.as_uuid() => Ok(OrderRegistration::AlreadyRegistered),
            Some(_) => Err(LoyaltyError::OrderOwnedByAnotherUser(number.to_string())),
            // orders are never deleted
            None => Err(LoyaltyError::Internal(format!(
                "order {number} conflicted on insert but is missing"
            ))),
        }
    }

    async fn list_orders(&self, user_id: &UserId) -> LoyaltyResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT number, user_id, status, accrual, uploaded_at
            FROM orders
            WHERE user_id = $1
            ORDER BY uploaded_at DESC, number DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn list_outstanding_orders(&self) -> LoyaltyResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT number, user_id, status, accrual, uploaded_at
            FROM orders
            WHERE status IN ('NEW', 'PROCESSING')
            ORDER BY uploaded_at, number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }
}

// ============================================================================
// Balance Repository Implementation
// ============================================================================

impl BalanceRepository for PgLedgerRepository {
    async fn open_account(&self, user_id: &UserId) -> LoyaltyResult<()> {
        sqlx::query("INSERT INTO balances (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_balance(&self, user_id: &UserId) -> LoyaltyResult<Balance> {
        let row = sqlx::query_as::<_, BalanceRow>(
            "SELECT current_points, withdrawn_points FROM balances WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BalanceRow::into_balance).unwrap_or_default())
    }

    async fn apply_accrual_result(
        &self,
        number: &OrderNumber,
        result: TerminalAccrual,
    ) -> LoyaltyResult<AccrualApplication> {
        let mut tx = self.pool.begin().await?;

        // the status guard makes a second verdict for the same order a no-op
        let owner: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET status = $2, accrual = $3
            WHERE number = $1 AND status IN ('NEW', 'PROCESSING')
            RETURNING user_id
            "#,
        )
        .bind(number.as_str())
        .bind(result.status().as_str())
        .bind(result.reward().map(Amount::minor))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(owner) = owner else {
            return Ok(AccrualApplication::Unchanged);
        };

        let credited = result.reward().unwrap_or_default();
        if credited.is_positive() {
            sqlx::query(
                r#"
                INSERT INTO balances (user_id, current_points)
                VALUES ($1, $2)
                ON CONFLICT (user_id)
                DO UPDATE SET current_points = balances.current_points + EXCLUDED.current_points
                "#,
            )
            .bind(owner)
            .bind(credited.minor())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(AccrualApplication::Applied {
            user_id: UserId::from_uuid(owner),
            credited,
        })
    }

    async fn debit(&self, withdrawal: &Withdrawal) -> LoyaltyResult<Balance> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, BalanceRow>(
            r#"
            UPDATE balances
            SET current_points = current_points - $2,
                withdrawn_points = withdrawn_points + $2
            WHERE user_id = $1 AND current_points >= $2
            RETURNING current_points, withdrawn_points
            "#,
        )
        .bind(withdrawal.user_id.as_uuid())
        .bind(withdrawal.sum.minor())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT current_points FROM balances WHERE user_id = $1")
                    .bind(withdrawal.user_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(LoyaltyError::InsufficientBalance {
                requested: withdrawal.sum,
                available: available.map(Amount::from_minor).unwrap_or_default(),
            });
        };

        sqlx::query(
            r#"
            INSERT INTO withdrawals (withdrawal_id, user_id, order_number, amount, processed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(withdrawal.id.as_uuid())
        .bind(withdrawal.user_id.as_uuid())
        .bind(withdrawal.order_number.as_str())
        .bind(withdrawal.sum.minor())
        .bind(withdrawal.processed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated.into_balance())
    }

    async fn list_withdrawals(&self, user_id: &UserId) -> LoyaltyResult<Vec<Withdrawal>> {
        let rows = sqlx::query_as::<_, WithdrawalRow>(
            r#"
            SELECT withdrawal_id, user_id, order_number, amount, processed_at
            FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WithdrawalRow::into_withdrawal).collect()
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct OrderRow {
    number: String,
    user_id: Uuid,
    status: String,
    accrual: Option<i64>,
    uploaded_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> LoyaltyResult<Order> {
        let number = OrderNumber::parse(&self.number).map_err(|e| {
            LoyaltyError::CorruptRecord(format!("order number {:?}: {e}", self.number))
        })?;
        let status = OrderStatus::from_code(&self.status).ok_or_else(|| {
            LoyaltyError::CorruptRecord(format!("order {number} has status {:?}", self.status))
        })?;

        Ok(Order {
            number,
            user_id: UserId::from_uuid(self.user_id),
            status,
            accrual: self.accrual.map(Amount::from_minor),
            uploaded_at: self.uploaded_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BalanceRow {
    current_points: i64,
    withdrawn_points: i64,
}

impl BalanceRow {
    fn into_balance(self) -> Balance {
        Balance {
            current: Amount::from_minor(self.current_points),
            withdrawn: Amount::from_minor(self.withdrawn_points),
        }
    }
}

#[derive(sqlx::FromRow)]
struct WithdrawalRow {
    withdrawal_id: Uuid,
    user_id: Uuid,
    order_number: String,
    amount: i64,
    processed_at: DateTime<Utc>,
}

impl WithdrawalRow {
    fn into_withdrawal(self) -> LoyaltyResult<Withdrawal> {
        let order_number = OrderNumber::parse(&self.order_number).map_err(|e| {
            LoyaltyError::CorruptRecord(format!(
                "withdrawal {} order number {:?}: {e}",
                self.withdrawal_id, self.order_number
            ))
        })?;

        Ok(Withdrawal {
            id: WithdrawalId::from_uuid(self.withdrawal_id),
            user_id: UserId::from_uuid(self.user_id),
            order_number,
            sum: Amount::from_minor(self.amount),
            processed_at: self.processed_at,
        })
    }
}
