//! Session Entity
//!
//! Server-side half of a session. Only the id travels to the client,
//! inside a signed token.

use std::time::Duration;

use chrono::Utc;
use kernel::id::{SessionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// Unix timestamp (ms)
    pub expires_at_ms: i64,
}

impl Session {
    /// TTL comes from config, never hard-coded here.
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            session_id: SessionId::new(),
            user_id,
            expires_at_ms: Utc::now().timestamp_millis().saturating_add(ttl_ms),
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }
}
