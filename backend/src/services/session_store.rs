use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::{models::session::RefreshRecord, utils::time::Clock};

/// Registry of outstanding refresh tokens keyed by session id.
///
/// Every method is atomic with respect to a single session id. Callers never
/// hold a reference into the store across calls.
pub trait SessionStore: Send + Sync {
    /// Adds or overwrites the record for `session_id`.
    fn insert(&self, session_id: &str, record: RefreshRecord);
    /// Returns a copy of the live record. Expired records are evicted and
    /// reported as absent.
    fn lookup(&self, session_id: &str) -> Option<RefreshRecord>;
    /// Sets `last_seen_at` to now. No-op when absent.
    fn touch(&self, session_id: &str);
    /// Removes the record. Revoking an absent id is a no-op.
    fn revoke(&self, session_id: &str);
    /// Removes the record and hands it to the caller. Of several concurrent
    /// callers for the same id, exactly one receives `Some`.
    fn take(&self, session_id: &str) -> Option<RefreshRecord>;
    /// Point-in-time copy of every entry, ordered by issue time.
    fn list_all(&self) -> Vec<(String, RefreshRecord)>;
    /// Drops records expired as of `now` and returns how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

/// Process-lifetime [`SessionStore`] backed by a sharded concurrent map.
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<String, RefreshRecord>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session_id: &str, record: RefreshRecord) {
        self.sessions.insert(session_id.to_string(), record);
    }

    fn lookup(&self, session_id: &str) -> Option<RefreshRecord> {
        let now = self.clock.now();
        // remove_if holds the shard lock, so a concurrent touch cannot revive
        // the entry between the expiry check and the removal.
        if let Some((_, expired)) = self
            .sessions
            .remove_if(session_id, |_, record| record.is_expired(now))
        {
            tracing::info!(
                session_id = %session_id,
                subject = %expired.subject,
                expired_at = %expired.expires_at,
                "session_expired_evicted"
            );
            return None;
        }
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    fn touch(&self, session_id: &str) {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.last_seen_at = self.clock.now();
        }
    }

    fn revoke(&self, session_id: &str) {
        if let Some((_, record)) = self.sessions.remove(session_id) {
            tracing::info!(
                session_id = %session_id,
                subject = %record.subject,
                "session_revoked"
            );
        }
    }

    fn take(&self, session_id: &str) -> Option<RefreshRecord> {
        self.sessions.remove(session_id).map(|(_, record)| record)
    }

    fn list_all(&self) -> Vec<(String, RefreshRecord)> {
        let mut snapshot: Vec<(String, RefreshRecord)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        snapshot.sort_by(|a, b| a.1.issued_at.cmp(&b.1.issued_at).then_with(|| a.0.cmp(&b.0)));
        snapshot
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut expired_count = 0;
        self.sessions.retain(|_, record| {
            if record.is_expired(now) {
                expired_count += 1;
                false
            } else {
                true
            }
        });
        expired_count
    }
}
