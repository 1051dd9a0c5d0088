//! # Session Registry
//!
//! Server-side map from session identifier to session metadata.
//!
//! ## Features
//! - **Thread-safe**: a single `Arc<Mutex<..>>` serialises every read and write,
//!   so `accept_and_handle` may run on several tasks at once
//! - **TTL-based expiration**: a session expires once it has been idle longer
//!   than the configured TTL
//! - **Lazy sweep**: expired entries are purged during each liveness update;
//!   there is no background timer
//!
//! ## Usage
//! ```ignore
//! use session_socket::protocol::session::SessionRegistry;
//! use std::time::Duration;
//!
//! let registry = SessionRegistry::new(Duration::from_secs(600));
//! let id = registry.open().await;
//! let session = registry.touch(&id).await?;
//! assert_eq!(session.request_count(), 1);
//! registry.close(&id).await;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::core::session_id::SessionId;
use crate::error::{ProtocolError, Result};
use crate::utils::metrics::global_metrics;

/// A live session
#[derive(Clone, Debug)]
pub struct Session {
    id: SessionId,
    created_at: Instant,
    last_touch: Instant,
    request_count: u64,
}

impl Session {
    fn new(id: SessionId, now: Instant) -> Self {
        Self {
            id,
            created_at: now,
            last_touch: now,
            request_count: 0,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the session was opened or last served a request
    pub fn last_touch(&self) -> Instant {
        self.last_touch
    }

    /// Acknowledge requests served so far
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Idle time as of `now`
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_touch)
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) > ttl
    }
}

/// Shared handle to the session map
#[derive(Clone)]
pub struct SessionRegistry {
    ttl: Duration,
    inner: Arc<Mutex<RegistryInner>>,
}

struct RegistryInner {
    sessions: HashMap<SessionId, Session>,
    total_opened: u64,
    total_expired: u64,
}

impl RegistryInner {
    /// Remove every entry idle longer than `ttl`, returning their ids
    fn sweep(&mut self, now: Instant, ttl: Duration) -> Vec<SessionId> {
        let expired: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|session| session.is_expired(now, ttl))
            .map(Session::id)
            .collect();

        for id in &expired {
            self.sessions.remove(id);
        }

        if !expired.is_empty() {
            self.total_expired += expired.len() as u64;
            global_metrics().sessions_expired(expired.len() as u64);
            debug!(
                removed_count = expired.len(),
                remaining_count = self.sessions.len(),
                "Expired sessions evicted"
            );
        }

        expired
    }
}

impl SessionRegistry {
    /// Create an empty registry whose sessions expire after `ttl` of idleness
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(Mutex::new(RegistryInner {
                sessions: HashMap::new(),
                total_opened: 0,
                total_expired: 0,
            })),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Register a new session under a freshly generated identifier
    pub async fn open(&self) -> SessionId {
        let mut inner = self.inner.lock().await;

        let mut id = SessionId::generate();
        while inner.sessions.contains_key(&id) {
            id = SessionId::generate();
        }

        inner.sessions.insert(id, Session::new(id, Instant::now()));
        inner.total_opened += 1;
        global_metrics().session_opened();

        debug!(session = %id, session_count = inner.sessions.len(), "Session opened");
        id
    }

    /// Remove `id`. Absence is not an error.
    pub async fn close(&self, id: &SessionId) -> Option<Session> {
        let mut inner = self.inner.lock().await;
        let removed = inner.sessions.remove(id);
        if removed.is_some() {
            global_metrics().session_closed();
            debug!(session = %id, session_count = inner.sessions.len(), "Session closed");
        } else {
            trace!(session = %id, "Close for unknown session");
        }
        removed
    }

    /// Liveness update for an acknowledge request.
    ///
    /// Fails with `InvalidSessionId` if `id` is unknown. Otherwise every entry
    /// idle longer than the TTL is removed; if `id` was among them the result
    /// is `ExpiredSessionId`. Unrelated expiries are purged silently. On
    /// success the session's last touch is refreshed and its request counter
    /// incremented; the updated session is returned.
    pub async fn touch(&self, id: &SessionId) -> Result<Session> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        if !inner.sessions.contains_key(id) {
            return Err(ProtocolError::InvalidSessionId);
        }

        let expired = inner.sweep(now, self.ttl);
        if expired.contains(id) {
            debug!(session = %id, "Session expired");
            return Err(ProtocolError::ExpiredSessionId);
        }

        let session = inner
            .sessions
            .get_mut(id)
            .ok_or(ProtocolError::InvalidSessionId)?;
        session.last_touch = now;
        session.request_count += 1;

        trace!(session = %id, request_count = session.request_count, "Session touched");
        Ok(session.clone())
    }

    /// Snapshot of a session, if present (no expiry check)
    pub async fn get(&self, id: &SessionId) -> Option<Session> {
        self.inner.lock().await.sessions.get(id).cloned()
    }

    pub async fn contains(&self, id: &SessionId) -> bool {
        self.inner.lock().await.sessions.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.sessions.is_empty()
    }

    /// Sweep expired sessions now; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.sweep(Instant::now(), self.ttl).len()
    }

    /// Clear all sessions from the registry
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        let count = inner.sessions.len();
        inner.sessions.clear();
        debug!(cleared_count = count, "Session registry cleared");
    }

    /// Get current registry statistics
    pub async fn stats(&self) -> RegistryStats {
        let inner = self.inner.lock().await;
        let now = Instant::now();

        RegistryStats {
            active_sessions: inner.sessions.len(),
            expired_pending: inner
                .sessions
                .values()
                .filter(|s| s.is_expired(now, self.ttl))
                .count(),
            total_opened: inner.total_opened,
            total_expired: inner.total_expired,
        }
    }
}

/// Statistics about the session registry
#[derive(Debug, Clone, Copy)]
pub struct RegistryStats {
    /// Sessions currently held, expired or not
    pub active_sessions: usize,
    /// Entries past their TTL that no sweep has removed yet
    pub expired_pending: usize,
    /// Sessions ever opened
    pub total_opened: u64,
    /// Sessions removed by expiry sweeps
    pub total_expired: u64,
}
