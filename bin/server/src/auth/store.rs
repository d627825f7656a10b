//! Interactive session storage.
//!
//! Each browser session owns a [`FlowCorrelation`] and a [`SecurityContext`]
//! behind its own async mutex. Handlers hold that mutex across a whole login
//! step, which serializes concurrent callbacks within one session while
//! leaving other sessions untouched.

use bitbucket_oauth_core::SessionId;
use bitbucket_oauth_realm::{FlowCorrelation, SecurityContext};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// State attached to one browser session.
#[derive(Debug, Default)]
pub struct InteractiveSession {
    /// Login flow state between commence and finish.
    pub correlation: FlowCorrelation,
    /// The principal bound to the session.
    pub context: SecurityContext,
}

/// Shared handle to one session's state.
pub type SessionHandle = Arc<Mutex<InteractiveSession>>;

#[derive(Debug)]
struct Entry {
    handle: SessionHandle,
    last_seen: DateTime<Utc>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>, idle_timeout: Duration) -> bool {
        now - self.last_seen > idle_timeout
    }
}

/// In-memory session store with idle expiry.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Entry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    /// Creates a store that drops sessions idle for longer than `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Starts a new, empty session.
    pub async fn create(&self) -> (SessionId, SessionHandle) {
        let id = SessionId::new();
        let handle = SessionHandle::default();
        self.sessions.write().await.insert(
            id,
            Entry {
                handle: Arc::clone(&handle),
                last_seen: Utc::now(),
            },
        );
        debug!(session_id = %id, "created session");
        (id, handle)
    }

    /// Returns a live session and marks it as seen.
    ///
    /// An expired session is dropped and reported as absent.
    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;

        if entry.is_expired(now, self.idle_timeout) {
            sessions.remove(id);
            debug!(session_id = %id, "session expired");
            return None;
        }

        entry.last_seen = now;
        Some(Arc::clone(&entry.handle))
    }

    /// Returns the session for `id` if it is live, otherwise starts a new one.
    pub async fn get_or_create(&self, id: Option<SessionId>) -> (SessionId, SessionHandle) {
        if let Some(id) = id {
            if let Some(handle) = self.get(&id).await {
                return (id, handle);
            }
        }
        self.create().await
    }

    /// Moves `session` under a fresh id and drops `old`.
    ///
    /// Called when a login binds a principal, so an id handed out before
    /// login never carries the authenticated session.
    pub async fn rotate(&self, old: &SessionId, session: InteractiveSession) -> SessionId {
        let id = SessionId::new();
        let mut sessions = self.sessions.write().await;
        sessions.remove(old);
        sessions.insert(
            id,
            Entry {
                handle: Arc::new(Mutex::new(session)),
                last_seen: Utc::now(),
            },
        );
        debug!(old_session_id = %old, session_id = %id, "rotated session");
        id
    }

    /// Drops a session.
    pub async fn remove(&self, id: &SessionId) {
        self.sessions.write().await.remove(id);
    }

    /// Drops every expired session, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now, self.idle_timeout));
        before - sessions.len()
    }

    /// Returns the number of stored sessions, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
