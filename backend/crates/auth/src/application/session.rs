//! Session issuance shared by registration and sign-in.

use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::domain::entity::session::Session;
use crate::domain::value_object::session_token::SessionToken;
use crate::infra::session_cache::SessionCache;

/// A freshly opened session
pub struct SessionOutput {
    pub user_id: UserId,
    pub token: SessionToken,
}

pub(crate) fn open_session(
    sessions: &SessionCache,
    config: &AuthConfig,
    user_id: UserId,
) -> SessionOutput {
    let session = Session::new(user_id, sessions.ttl());
    let token = SessionToken::issue(&config.session_secret, &session.session_id);

    tracing::debug!(user_id = %user_id, session_id = %session.session_id, "Session opened");
    sessions.insert(session);

    SessionOutput { user_id, token }
}
