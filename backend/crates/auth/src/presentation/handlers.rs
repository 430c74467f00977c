//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use platform::cookie::bearer_header;

use crate::application::config::AuthConfig;
use crate::application::{
    RegisterInput, RegisterUseCase, SessionOutput, SignInInput, SignInUseCase,
};
use crate::domain::repository::{AccountOpener, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::infra::session_cache::SessionCache;
use crate::presentation::dto::CredentialsRequest;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<U, A>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    A: AccountOpener + Clone + Send + Sync + 'static,
{
    pub users: Arc<U>,
    pub accounts: Arc<A>,
    pub sessions: Arc<SessionCache>,
    pub config: Arc<AuthConfig>,
}

/// 200 carrying the token both as a bearer header and as a cookie.
fn session_response(config: &AuthConfig, output: &SessionOutput) -> AuthResult<Response> {
    let token = output.token.as_str();
    let bearer = bearer_header(token)
        .ok_or_else(|| AuthError::Internal("session token is not a valid header".to_string()))?;
    let cookie = config
        .session_cookie()
        .set_cookie_header(token)
        .ok_or_else(|| AuthError::Internal("session cookie is not a valid header".to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::AUTHORIZATION, bearer), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

fn credentials(payload: Result<Json<CredentialsRequest>, JsonRejection>) -> AuthResult<CredentialsRequest> {
    payload
        .map(|Json(req)| req)
        .map_err(|e| AuthError::MalformedRequest(e.body_text()))
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/user/register
pub async fn register<U, A>(
    State(state): State<AuthAppState<U, A>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AuthResult<Response>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    A: AccountOpener + Clone + Send + Sync + 'static,
{
    let req = credentials(payload)?;

    let use_case = RegisterUseCase::new(
        state.users.clone(),
        state.accounts.clone(),
        state.sessions.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            login: req.login,
            password: req.password,
        })
        .await?;

    session_response(&state.config, &output)
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/user/login
pub async fn login<U, A>(
    State(state): State<AuthAppState<U, A>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AuthResult<Response>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    A: AccountOpener + Clone + Send + Sync + 'static,
{
    let req = credentials(payload)?;

    let use_case = SignInUseCase::new(
        state.users.clone(),
        state.sessions.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignInInput {
            login: req.login,
            password: req.password,
        })
        .await?;

    session_response(&state.config, &output)
}
