//! API DTOs (Data Transfer Objects)

use serde::Deserialize;

/// Body of `POST /api/user/register` and `POST /api/user/login`
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub login: String,
    pub password: String,
}

// the password must never reach a log line
impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}
