//! User Entity

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::value_object::login::Login;

/// Registered user with credentials
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique across all users
    pub login: Login,
    /// Argon2id PHC string
    pub password_hash: HashedPassword,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(login: Login, password_hash: HashedPassword) -> Self {
        Self {
            user_id: UserId::new(),
            login,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
