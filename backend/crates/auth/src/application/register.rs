//! Register Use Case
//!
//! Creates a user, opens their points ledger and signs them in.
//! A user whose ledger cannot be opened is removed again, so the login
//! stays free for a retry.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::session::{SessionOutput, open_session};
use crate::domain::entity::user::User;
use crate::domain::repository::{AccountOpener, UserRepository};
use crate::domain::value_object::login::Login;
use crate::error::{AuthError, AuthResult};
use crate::infra::session_cache::SessionCache;

/// Register input
pub struct RegisterInput {
    pub login: String,
    pub password: String,
}

/// Register use case
pub struct RegisterUseCase<U, A>
where
    U: UserRepository,
    A: AccountOpener,
{
    user_repo: Arc<U>,
    accounts: Arc<A>,
    sessions: Arc<SessionCache>,
    config: Arc<AuthConfig>,
}

impl<U, A> RegisterUseCase<U, A>
where
    U: UserRepository,
    A: AccountOpener,
{
    pub fn new(
        user_repo: Arc<U>,
        accounts: Arc<A>,
        sessions: Arc<SessionCache>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            accounts,
            sessions,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<SessionOutput> {
        let login =
            Login::new(&input.login).map_err(|e| AuthError::InvalidLogin(e.to_string()))?;
        let password = ClearTextPassword::new(input.password)
            .map_err(|e| AuthError::PasswordPolicy(e.to_string()))?;
        let password_hash = password
            .hash(self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = User::new(login, password_hash);
        self.user_repo.create(&user).await?;
        if let Err(e) = self.accounts.open_account(&user.user_id).await {
            if let Err(undo) = self.user_repo.delete(&user.user_id).await {
                tracing::error!(
                    user_id = %user.user_id,
                    error = %undo,
                    "Failed to remove user after ledger account error"
                );
            }
            return Err(e);
        }

        tracing::info!(user_id = %user.user_id, login = %user.login, "User registered");

        Ok(open_session(&self.sessions, &self.config, user.user_id))
    }
}
