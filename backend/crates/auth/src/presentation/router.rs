//! Auth Router
//!
//! Public routes, relative to `/api/user`.

use axum::{Router, routing::post};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{AccountOpener, UserRepository};
use crate::infra::postgres::PgUserRepository;
use crate::infra::session_cache::SessionCache;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::AuthMiddlewareState;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router<A>(
    users: PgUserRepository,
    accounts: A,
    sessions: Arc<SessionCache>,
    config: Arc<AuthConfig>,
) -> Router
where
    A: AccountOpener + Clone + Send + Sync + 'static,
{
    auth_router_generic(users, accounts, sessions, config)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<U, A>(
    users: U,
    accounts: A,
    sessions: Arc<SessionCache>,
    config: Arc<AuthConfig>,
) -> Router
where
    U: UserRepository + Clone + Send + Sync + 'static,
    A: AccountOpener + Clone + Send + Sync + 'static,
{
    let state = AuthAppState {
        users: Arc::new(users),
        accounts: Arc::new(accounts),
        sessions,
        config,
    };

    Router::new()
        .route("/register", post(handlers::register::<U, A>))
        .route("/login", post(handlers::login::<U, A>))
        .with_state(state)
}

/// State for `middleware::require_auth`, sharing the router's session cache.
pub fn auth_middleware_state(
    sessions: Arc<SessionCache>,
    config: Arc<AuthConfig>,
) -> AuthMiddlewareState {
    AuthMiddlewareState { sessions, config }
}
