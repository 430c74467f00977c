//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::value_object::login::Login;
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user. Fails with `LoginTaken` on a duplicate login.
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by login
    async fn find_by_login(&self, login: &Login) -> AuthResult<Option<User>>;

    /// Remove a user that never finished registering. Missing users are not an error.
    async fn delete(&self, user_id: &UserId) -> AuthResult<()>;
}

/// Opens the points ledger of a freshly registered user.
///
/// Implemented outside this crate so auth does not depend on the ledger.
#[trait_variant::make(AccountOpener: Send)]
pub trait LocalAccountOpener {
    /// Idempotent.
    async fn open_account(&self, user_id: &UserId) -> AuthResult<()>;
}
