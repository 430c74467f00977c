//! Submit Order Use Case
//!
//! Registers an order number for points accrual.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entities::OrderRegistration;
use crate::domain::repository::OrderRepository;
use crate::domain::value_objects::OrderNumber;
use crate::error::{LoyaltyError, LoyaltyResult};

/// Submit order use case
pub struct SubmitOrderUseCase<R>
where
    R: OrderRepository,
{
    repo: Arc<R>,
}

impl<R> SubmitOrderUseCase<R>
where
    R: OrderRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// `raw_number` is the request body as sent; surrounding whitespace is
    /// ignored.
    pub async fn execute(
        &self,
        user_id: &UserId,
        raw_number: &str,
    ) -> LoyaltyResult<OrderRegistration> {
        if raw_number.trim().is_empty() {
            return Err(LoyaltyError::EmptyOrderNumber);
        }
        let number = OrderNumber::parse(raw_number)?;

        let registration = self.repo.register_order(user_id, &number).await?;
        match registration {
            OrderRegistration::Created => {
                tracing::info!(user_id = %user_id, order = %number, "Order uploaded");
            }
            OrderRegistration::AlreadyRegistered => {
                tracing::debug!(user_id = %user_id, order = %number, "Order was already uploaded");
            }
        }

        Ok(registration)
    }
}
