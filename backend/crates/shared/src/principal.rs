//! Authenticated principal
//!
//! Inserted into request extensions by the session middleware and read by
//! every protected handler.

use crate::id::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
}

impl CurrentUser {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
