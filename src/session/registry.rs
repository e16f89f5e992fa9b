//! Session id → learner session mapping.
//!
//! Sessions idle for longer than the TTL are dropped whenever a new one is
//! created. At capacity the least recently used session makes room.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use super::LearnerSession;
use crate::gamification::ProfileDefaults;

pub type SharedSession = Arc<Mutex<LearnerSession>>;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1_000;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
    /// Recency order for capacity eviction.
    touched: u64,
}

/// Live sessions. Each one is locked on its own, so requests for different
/// learners never wait on each other.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Entry>,
    defaults: ProfileDefaults,
    badge_threshold: usize,
    idle_ttl: Duration,
    max_sessions: usize,
    clock: AtomicU64,
}

impl SessionRegistry {
    pub fn new(defaults: ProfileDefaults, badge_threshold: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            defaults,
            badge_threshold,
            idle_ttl: DEFAULT_SESSION_TTL,
            max_sessions: DEFAULT_MAX_SESSIONS,
            clock: AtomicU64::new(0),
        }
    }

    /// Override the idle TTL and the session cap (at least 1).
    pub fn with_limits(mut self, idle_ttl: Duration, max_sessions: usize) -> Self {
        self.idle_ttl = idle_ttl;
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Start a fresh session with a default profile.
    pub fn create(&self) -> (Uuid, SharedSession) {
        self.evict_idle(Instant::now());
        self.evict_overflow();

        let session = LearnerSession::new(self.defaults.clone(), self.badge_threshold);
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(
            id,
            Entry {
                session: Arc::clone(&shared),
                last_seen: Instant::now(),
                touched: self.tick(),
            },
        );
        info!(session_id = %id, active = self.sessions.len(), "Session created");
        (id, shared)
    }

    /// Look a session up and mark it as used.
    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        let mut entry = self.sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        entry.touched = self.tick();
        Some(Arc::clone(&entry.session))
    }

    /// Drop a session. Returns false when it did not exist.
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session removed");
        }
        removed
    }

    /// Drop sessions not used within the TTL as of `now`. Returns how many.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= self.idle_ttl);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Make room for one more session.
    fn evict_overflow(&self) {
        while self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.touched)
                .map(|entry| *entry.key());
            let Some(id) = oldest else { break };
            self.sessions.remove(&id);
            info!(session_id = %id, "Evicted least recently used session");
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(
            ProfileDefaults::default(),
            crate::roleplay::engine::DEFAULT_BADGE_THRESHOLD,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_lookup() {
        let registry = SessionRegistry::default();
        let (id, session) = registry.create();

        let found = registry.get(&id).unwrap();
        assert!(Arc::ptr_eq(&session, &found));
        assert_eq!(found.lock().await.id(), id);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn sessions_use_configured_defaults() {
        let defaults = ProfileDefaults {
            name: "Ana".into(),
            current_language: "es".into(),
            native_language: "pt".into(),
        };
        let registry = SessionRegistry::new(defaults, 3);
        let (_, session) = registry.create();

        let session = session.lock().await;
        assert_eq!(session.profile().name, "Ana");
        assert_eq!(session.chat_language(), "es");
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = SessionRegistry::default();
        let (id, _) = registry.create();

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn idle_sessions_expire() {
        let registry = SessionRegistry::default().with_limits(Duration::from_secs(60), 100);
        let (stale, _) = registry.create();
        let (fresh, _) = registry.create();

        let later = Instant::now() + Duration::from_secs(45);
        assert_eq!(registry.evict_idle(later), 0);

        assert!(registry.get(&fresh).is_some());
        let much_later = Instant::now() + Duration::from_secs(90);
        // `fresh` was just touched, but 90s is past the TTL for both
        assert_eq!(registry.evict_idle(much_later), 2);
        assert!(registry.get(&stale).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn create_sweeps_expired_sessions() {
        let registry = SessionRegistry::default().with_limits(Duration::ZERO, 100);
        let (old, _) = registry.create();
        std::thread::sleep(Duration::from_millis(2));
        let (new, _) = registry.create();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&old).is_none());
        assert!(registry.get(&new).is_some());
    }

    #[test]
    fn unbounded_creation_stays_bounded() {
        let registry = SessionRegistry::default();
        for _ in 0..10_000 {
            registry.create();
        }
        assert_eq!(registry.len(), DEFAULT_MAX_SESSIONS);
    }

    #[test]
    fn session_count_is_capped() {
        let registry = SessionRegistry::default().with_limits(DEFAULT_SESSION_TTL, 3);
        let (a, _) = registry.create();
        let (b, _) = registry.create();
        let (c, _) = registry.create();

        registry.get(&a).unwrap();
        let (d, _) = registry.create();

        assert_eq!(registry.len(), 3);
        assert!(registry.get(&b).is_none());
        for id in [a, c, d] {
            assert!(registry.get(&id).is_some());
        }

        for _ in 0..10_000 {
            registry.create();
        }
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unknown_id_is_none() {
        let registry = SessionRegistry::default();
        assert!(registry.get(&Uuid::new_v4()).is_none());
    }
}
