//! Sign In Use Case
//!
//! Verifies credentials and opens a session.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::session::{SessionOutput, open_session};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::login::Login;
use crate::error::{AuthError, AuthResult};
use crate::infra::session_cache::SessionCache;

/// Sign in input
pub struct SignInInput {
    pub login: String,
    pub password: String,
}

/// Sign in use case
pub struct SignInUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    sessions: Arc<SessionCache>,
    config: Arc<AuthConfig>,
}

impl<U> SignInUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, sessions: Arc<SessionCache>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            sessions,
            config,
        }
    }

    /// Unknown login and wrong password both yield `InvalidCredentials`.
    pub async fn execute(&self, input: SignInInput) -> AuthResult<SessionOutput> {
        let login = Login::new(&input.login).map_err(|_| AuthError::InvalidCredentials)?;
        let password =
            ClearTextPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .user_repo
            .find_by_login(&login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.password_hash.verify(&password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.user_id, "User signed in");

        Ok(open_session(&self.sessions, &self.config, user.user_id))
    }
}
