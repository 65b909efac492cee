//! Session storage: uploaded documents keyed by an opaque identifier.
//!
//! Handlers only see the [`SessionStore`] trait. The bundled backend,
//! [`InMemorySessionStore`], keeps sessions in a `RwLock<HashMap>` for the
//! life of the process, optionally bounded by a TTL. Sessions are handed out
//! as `Arc<Session>` so concurrent readers share page text instead of
//! copying it.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// An uploaded document. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    /// Extracted text, one entry per PDF page, in page order.
    pub pages: Vec<String>,
    /// Summary generated at upload (or the placeholder if that failed).
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a session with a fresh random identifier.
    pub fn new(pages: Vec<String>, summary: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pages,
            summary,
            created_at: Utc::now(),
        }
    }

    /// Whether this session has outlived `ttl` at `now`. An expiry past the
    /// end of representable time never arrives.
    pub fn is_expired(&self, ttl: Option<ChronoDuration>, now: DateTime<Utc>) -> bool {
        ttl.and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .is_some_and(|expires_at| expires_at <= now)
    }
}

/// Key-value storage for sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a session under its own id.
    async fn insert(&self, session: Session) -> Arc<Session>;

    /// Look up a live session.
    async fn get(&self, id: &str) -> Option<Arc<Session>>;

    /// Remove a session. Returns whether it existed.
    async fn remove(&self, id: &str) -> bool;

    /// Drop every expired session, returning how many were removed.
    async fn purge_expired(&self) -> usize;

    /// Number of stored sessions, expired or not.
    async fn len(&self) -> usize;
}

/// In-process [`SessionStore`].
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
    ttl: Option<ChronoDuration>,
}

impl InMemorySessionStore {
    /// Store that keeps sessions until removed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose sessions expire `ttl` after creation. A `ttl` too large
    /// for chrono behaves like no TTL; `ServerConfigBuilder::build` rejects
    /// such values before they get here.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl: ChronoDuration::from_std(ttl).ok(),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), Arc::clone(&session));

        tracing::info!(
            session_id = %session.id,
            pages = session.pages.len(),
            active = sessions.len(),
            "Created session"
        );

        session
    }

    async fn get(&self, id: &str) -> Option<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .filter(|s| !s.is_expired(self.ttl, Utc::now()))
            .cloned()
    }

    async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    async fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl, now));
        let purged = before - sessions.len();

        if purged > 0 {
            tracing::info!(purged, remaining = sessions.len(), "Purged expired sessions");
        }
        purged
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Periodically purge expired sessions until the task is aborted.
pub fn spawn_sweeper(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            store.purge_expired().await;
        }
    })
}
