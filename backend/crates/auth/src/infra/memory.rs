//! In-memory user repository
//!
//! Same contract as the PostgreSQL store, including `LoginTaken`.

use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::UserId;
use tokio::sync::Mutex;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::login::Login;
use crate::error::{AuthError, AuthResult};

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.lock().await;
        if users.contains_key(user.login.as_str()) {
            return Err(AuthError::LoginTaken);
        }
        users.insert(user.login.as_str().to_string(), user.clone());
        Ok(())
    }

    async fn find_by_login(&self, login: &Login) -> AuthResult<Option<User>> {
        Ok(self.users.lock().await.get(login.as_str()).cloned())
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<()> {
        self.users
            .lock()
            .await
            .retain(|_, user| user.user_id != *user_id);
        Ok(())
    }
}
