//! Check Session Use Case
//!
//! Resolves a session token to the user it belongs to.

use std::sync::Arc;

use kernel::principal::CurrentUser;

use crate::application::config::AuthConfig;
use crate::domain::value_object::session_token::SessionToken;
use crate::error::{AuthError, AuthResult};
use crate::infra::session_cache::SessionCache;

/// Check session use case
pub struct CheckSessionUseCase {
    sessions: Arc<SessionCache>,
    config: Arc<AuthConfig>,
}

impl CheckSessionUseCase {
    pub fn new(sessions: Arc<SessionCache>, config: Arc<AuthConfig>) -> Self {
        Self { sessions, config }
    }

    pub fn execute(&self, token: &str) -> AuthResult<CurrentUser> {
        let session_id = SessionToken::verify(&self.config.session_secret, token)
            .ok_or(AuthError::SessionInvalid)?;

        let session = self
            .sessions
            .get(&session_id)
            .ok_or(AuthError::SessionInvalid)?;

        Ok(CurrentUser::new(session.user_id))
    }
}
