//! Loyalty Router
//!
//! Routes are relative to `/api/user`. The caller must layer session
//! authentication on top; handlers expect a `CurrentUser` extension.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::domain::repository::{BalanceRepository, OrderRepository};
use crate::infra::postgres::PgLedgerRepository;
use crate::presentation::handlers::{self, LoyaltyAppState};

/// Create the loyalty router with the PostgreSQL ledger
pub fn loyalty_router(repo: PgLedgerRepository) -> Router {
    loyalty_router_generic(repo)
}

/// Create a loyalty router for any ledger implementation
pub fn loyalty_router_generic<R>(repo: R) -> Router
where
    R: OrderRepository + BalanceRepository + Clone + Send + Sync + 'static,
{
    let state = LoyaltyAppState {
        repo: Arc::new(repo),
    };

    Router::new()
        .route(
            "/orders",
            post(handlers::upload_order::<R>).get(handlers::list_orders::<R>),
        )
        .route("/balance", get(handlers::get_balance::<R>))
        .route("/balance/withdraw", post(handlers::withdraw::<R>))
        .route("/withdrawals", get(handlers::list_withdrawals::<R>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::TerminalAccrual;
    use crate::domain::value_objects::{Amount, OrderNumber};
    use crate::infra::memory::InMemoryLedger;
    use axum::Extension;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use kernel::id::UserId;
    use kernel::principal::CurrentUser;
    use tower::ServiceExt;

    fn app(ledger: InMemoryLedger, user: UserId) -> Router {
        loyalty_router_generic(ledger).layer(Extension(CurrentUser::new(user)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn post_text(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn upload_answers_accepted_then_ok() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();

        let (status, _) = send(app(ledger.clone(), user), post_text("/orders", "12345678903")).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let (status, _) = send(app(ledger.clone(), user), post_text("/orders", "12345678903")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(app(ledger.clone(), UserId::new()), post_text("/orders", "12345678903")).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn upload_rejects_bad_bodies() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();

        let (status, _) = send(app(ledger.clone(), user), post_text("/orders", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = send(app(ledger.clone(), user), post_text("/orders", "12345678904")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], 422);
    }

    #[tokio::test]
    async fn empty_listings_are_no_content() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();

        let (status, _) = send(app(ledger.clone(), user), get("/orders")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(app(ledger.clone(), user), get("/withdrawals")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn orders_balance_and_withdrawals_flow() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();
        send(app(ledger.clone(), user), post_text("/orders", "12345678903")).await;
        send(app(ledger.clone(), user), post_text("/orders", "79927398713")).await;
        ledger
            .apply_accrual_result(
                &OrderNumber::parse("12345678903").unwrap(),
                TerminalAccrual::Processed {
                    reward: Amount::from_minor(72_998),
                },
            )
            .await
            .unwrap();

        let (status, orders) = send(app(ledger.clone(), user), get("/orders")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(orders[0]["number"], "79927398713");
        assert_eq!(orders[0]["status"], "NEW");
        assert!(orders[0].get("accrual").is_none());
        assert_eq!(orders[1]["status"], "PROCESSED");
        assert_eq!(orders[1]["accrual"], 729.98);

        let (status, _) = send(
            app(ledger.clone(), user),
            post_json("/balance/withdraw", r#"{"order":"2377225624","sum":751}"#),
        )
        .await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

        let (status, _) = send(
            app(ledger.clone(), user),
            post_json("/balance/withdraw", r#"{"order":"2377225624","sum":29.98}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, balance) = send(app(ledger.clone(), user), get("/balance")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(balance["current"], 700.0);
        assert_eq!(balance["withdrawn"], 29.98);

        let (status, withdrawals) = send(app(ledger.clone(), user), get("/withdrawals")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(withdrawals[0]["order"], "2377225624");
        assert_eq!(withdrawals[0]["sum"], 29.98);
        assert!(withdrawals[0]["processed_at"].is_string());
    }

    #[tokio::test]
    async fn withdraw_validates_its_body() {
        let ledger = InMemoryLedger::new();
        let user = UserId::new();

        let (status, _) = send(app(ledger.clone(), user), post_json("/balance/withdraw", r#"{"order":"18""#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(app(ledger.clone(), user), post_json("/balance/withdraw", r#"{"order":"18"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(
            app(ledger.clone(), user),
            post_json("/balance/withdraw", r#"{"order":"19","sum":1}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, _) = send(
            app(ledger.clone(), user),
            post_json("/balance/withdraw", r#"{"order":"18","sum":-5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
