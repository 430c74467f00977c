//! HTTP Handlers
//!
//! Every route here sits behind the session middleware, which puts the
//! caller's [`CurrentUser`] into the request extensions.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use kernel::principal::CurrentUser;
use std::sync::Arc;

use crate::application::{
    GetBalanceUseCase, ListOrdersUseCase, ListWithdrawalsUseCase, RequestWithdrawalInput,
    RequestWithdrawalUseCase, SubmitOrderUseCase,
};
use crate::domain::entities::OrderRegistration;
use crate::domain::repository::{BalanceRepository, OrderRepository};
use crate::error::{LoyaltyError, LoyaltyResult};
use crate::presentation::dto::{
    BalanceResponse, OrderResponse, WithdrawRequest, WithdrawalResponse,
};

/// Shared state for loyalty handlers
#[derive(Clone)]
pub struct LoyaltyAppState<R>
where
    R: OrderRepository + BalanceRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
}

/// 204 for an empty listing, a JSON array otherwise.
fn listing<T: serde::Serialize>(items: Vec<T>) -> Response {
    if items.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Json(items).into_response()
    }
}

// ============================================================================
// Orders
// ============================================================================

/// POST /api/user/orders
///
/// Body is the bare order number as text.
pub async fn upload_order<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(user): Extension<CurrentUser>,
    body: String,
) -> LoyaltyResult<StatusCode>
where
    R: OrderRepository + BalanceRepository + Clone + Send + Sync + 'static,
{
    let use_case = SubmitOrderUseCase::new(state.repo.clone());

    match use_case.execute(&user.user_id, &body).await? {
        OrderRegistration::Created => Ok(StatusCode::ACCEPTED),
        OrderRegistration::AlreadyRegistered => Ok(StatusCode::OK),
    }
}

/// GET /api/user/orders
pub async fn list_orders<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(user): Extension<CurrentUser>,
) -> LoyaltyResult<Response>
where
    R: OrderRepository + BalanceRepository + Clone + Send + Sync + 'static,
{
    let use_case = ListOrdersUseCase::new(state.repo.clone());
    let orders = use_case.execute(&user.user_id).await?;

    Ok(listing(
        orders.into_iter().map(OrderResponse::from).collect(),
    ))
}

// ============================================================================
// Balance
// ============================================================================

/// GET /api/user/balance
pub async fn get_balance<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(user): Extension<CurrentUser>,
) -> LoyaltyResult<Json<BalanceResponse>>
where
    R: OrderRepository + BalanceRepository + Clone + Send + Sync + 'static,
{
    let use_case = GetBalanceUseCase::new(state.repo.clone());
    let balance = use_case.execute(&user.user_id).await?;

    Ok(Json(balance.into()))
}

/// POST /api/user/balance/withdraw
pub async fn withdraw<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<WithdrawRequest>, JsonRejection>,
) -> LoyaltyResult<StatusCode>
where
    R: OrderRepository + BalanceRepository + Clone + Send + Sync + 'static,
{
    let Json(req) = payload.map_err(|e| LoyaltyError::MalformedRequest(e.body_text()))?;

    let use_case = RequestWithdrawalUseCase::new(state.repo.clone());
    use_case
        .execute(RequestWithdrawalInput {
            user_id: user.user_id,
            order: req.order,
            sum: req.sum,
        })
        .await?;

    Ok(StatusCode::OK)
}

/// GET /api/user/withdrawals
pub async fn list_withdrawals<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(user): Extension<CurrentUser>,
) -> LoyaltyResult<Response>
where
    R: OrderRepository + BalanceRepository + Clone + Send + Sync + 'static,
{
    let use_case = ListWithdrawalsUseCase::new(state.repo.clone());
    let withdrawals = use_case.execute(&user.user_id).await?;

    Ok(listing(
        withdrawals
            .into_iter()
            .map(WithdrawalResponse::from)
            .collect(),
    ))
}
