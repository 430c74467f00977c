//! In-process session cache
//!
//! Sessions live only in memory; a restart signs everyone out. Expired
//! entries are invisible to `get` and are physically dropped by `sweep`,
//! which a background task runs every `ttl / 3`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use kernel::id::SessionId;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::entity::session::Session;

/// Floor for the sweep period, so tiny TTLs do not spin the sweeper.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

pub struct SessionCache {
    ttl: Duration,
    entries: Mutex<HashMap<SessionId, Session>>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sweep_interval(&self) -> Duration {
        (self.ttl / 3).max(MIN_SWEEP_INTERVAL)
    }

    // a panic while holding the lock cannot leave the map half-updated
    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Session>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, session: Session) {
        self.lock().insert(session.session_id, session);
    }

    /// `None` for unknown and expired sessions alike.
    pub fn get(&self, session_id: &SessionId) -> Option<Session> {
        let now_ms = Utc::now().timestamp_millis();
        let mut entries = self.lock();

        match entries.get(session_id) {
            Some(session) if session.is_expired_at(now_ms) => {
                entries.remove(session_id);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    pub fn remove(&self, session_id: &SessionId) -> Option<Session> {
        self.lock().remove(session_id)
    }

    /// Drop every expired entry; returns how many went.
    pub fn sweep(&self) -> usize {
        let now_ms = Utc::now().timestamp_millis();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, session| !session.is_expired_at(now_ms));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sweep periodically until shutdown (or until the sender is dropped).
    pub fn spawn_sweeper(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let interval = self.sweep_interval();

        tokio::spawn(async move {
            tracing::debug!(interval_ms = interval.as_millis() as u64, "Session sweeper started");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = cache.len(), "Expired sessions swept");
                        }
                    }
                    _ = shutdown.wait_for(|stop| *stop) => break,
                }
            }
            tracing::debug!("Session sweeper stopped");
        })
    }
}
