use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::UserSession;

/// Handle to one user's session. Holding the lock serializes that user's actions.
pub type SharedSession = Arc<Mutex<UserSession>>;

#[derive(Debug)]
struct StoredSession {
    session: SharedSession,
    last_accessed: DateTime<Utc>,
}

/// In-memory user sessions with idle expiry and capacity-based eviction
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
    max_sessions: usize,
    ttl: TimeDelta,
}

impl SessionStore {
    /// A TTL too large to represent means sessions never expire
    pub fn new(max_sessions: usize, ttl_minutes: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions: max_sessions.max(1),
            ttl: TimeDelta::try_minutes(ttl_minutes.max(0)).unwrap_or(TimeDelta::MAX),
        }
    }

    fn is_expired(&self, stored: &StoredSession, now: DateTime<Utc>) -> bool {
        stored
            .last_accessed
            .checked_add_signed(self.ttl)
            .is_some_and(|deadline| deadline <= now)
    }

    /// Start a new session in the main phase
    pub async fn create(&self) -> (Uuid, SharedSession) {
        let session = UserSession::new();
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;

        self.cleanup_expired_entries(&mut sessions, now);

        if sessions.len() >= self.max_sessions {
            Self::evict_least_recent(&mut sessions);
        }

        sessions.insert(
            id,
            StoredSession {
                session: shared.clone(),
                last_accessed: now,
            },
        );

        debug!("Created session {}, store size: {}", id, sessions.len());
        (id, shared)
    }

    /// Look up a live session and mark it as used
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();

        let expired = self.is_expired(sessions.get(&id)?, now);
        if expired {
            debug!("Session {} expired, removing", id);
            sessions.remove(&id);
            return None;
        }

        let stored = sessions.get_mut(&id)?;
        stored.last_accessed = now;
        Some(stored.session.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            debug!("Removed session {}", id);
        }
        removed
    }

    pub async fn get_stats(&self) -> SessionStats {
        let sessions = self.sessions.read().await;
        let now = Utc::now();

        let total_sessions = sessions.len();
        let expired_sessions = sessions
            .values()
            .filter(|stored| self.is_expired(stored, now))
            .count();

        SessionStats {
            total_sessions,
            expired_sessions,
            active_sessions: total_sessions - expired_sessions,
            max_sessions: self.max_sessions,
        }
    }

    /// Remove every expired session
    pub async fn cleanup(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let removed = self.cleanup_expired_entries(&mut sessions, Utc::now());
        if removed > 0 {
            info!(removed = removed, "Expired sessions cleaned up");
        }
        removed
    }

    fn cleanup_expired_entries(
        &self,
        sessions: &mut HashMap<Uuid, StoredSession>,
        now: DateTime<Utc>,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|id, stored| {
            let keep = !self.is_expired(stored, now);
            if !keep {
                debug!("Removed expired session {}", id);
            }
            keep
        });
        before - sessions.len()
    }

    fn evict_least_recent(sessions: &mut HashMap<Uuid, StoredSession>) {
        if let Some(oldest) = sessions
            .iter()
            .min_by_key(|(_, stored)| stored.last_accessed)
            .map(|(id, _)| *id)
        {
            sessions.remove(&oldest);
            debug!("Evicted least recently used session {}", oldest);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub expired_sessions: usize,
    pub active_sessions: usize,
    pub max_sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phase;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new(10, 60);
        let (id, _) = store.create().await;

        let session = store.get(id).await.unwrap();
        let session = session.lock().await;
        assert_eq!(session.id(), id);
        assert_eq!(session.phase(), Phase::Main);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new(10, 60);
        let (first, _) = store.create().await;
        let (second, _) = store.create().await;
        assert_ne!(first, second);

        let a = store.get(first).await.unwrap();
        let b = store.get(second).await.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_unknown_and_removed_sessions() {
        let store = SessionStore::new(10, 60);
        assert!(store.get(Uuid::new_v4()).await.is_none());

        let (id, _) = store.create().await;
        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(store.get(id).await.is_none());
        assert_eq!(store.get_stats().await.total_sessions, 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let store = SessionStore::new(2, 60);
        let (first, _) = store.create().await;
        let (second, _) = store.create().await;

        // touch the first so the second becomes the eviction candidate
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.get(first).await.unwrap();

        let (third, _) = store.create().await;
        assert_eq!(store.get_stats().await.total_sessions, 2);
        assert!(store.get(first).await.is_some());
        assert!(store.get(second).await.is_none());
        assert!(store.get(third).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let store = SessionStore::new(10, 0);
        let (id, _) = store.create().await;

        let stats = store.get_stats().await;
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.expired_sessions, 1);

        assert!(store.get(id).await.is_none());
        assert_eq!(store.cleanup().await, 0);
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_sessions() {
        let store = SessionStore::new(10, 0);
        store.create().await;

        assert_eq!(store.cleanup().await, 1);
        assert_eq!(store.get_stats().await.total_sessions, 0);
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let store = SessionStore::new(10, 9_000_000_000_000_000);
        let (id, _) = store.create().await;

        assert!(store.get(id).await.is_some());
        assert_eq!(store.get_stats().await.expired_sessions, 0);
        assert_eq!(store.cleanup().await, 0);
    }

    #[tokio::test]
    async fn test_negative_ttl_is_treated_as_zero() {
        let store = SessionStore::new(10, -5);
        let (id, _) = store.create().await;
        assert!(store.get(id).await.is_none());
    }
}
