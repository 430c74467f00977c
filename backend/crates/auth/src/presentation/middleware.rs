//! Auth Middleware
//!
//! Middleware for requiring authentication on protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use platform::cookie::extract_session_token;

use crate::application::CheckSessionUseCase;
use crate::application::config::AuthConfig;
use crate::error::AuthError;
use crate::infra::session_cache::SessionCache;

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub sessions: Arc<SessionCache>,
    pub config: Arc<AuthConfig>,
}

/// Middleware that requires a valid session.
///
/// Accepts `Authorization: Bearer` first, then the session cookie, and
/// puts the resolved `CurrentUser` into the request extensions.
pub async fn require_auth(
    State(state): State<AuthMiddlewareState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_session_token(req.headers(), &state.config.session_cookie_name)
        .ok_or(AuthError::SessionInvalid)?;

    let use_case = CheckSessionUseCase::new(state.sessions.clone(), state.config.clone());
    let user = use_case.execute(&token)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
