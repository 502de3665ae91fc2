//! Session identity shared between the authentication collaborator and the
//! realtime client.
//!
//! The store has an explicit lifecycle: [`SessionStore::begin`] after a
//! successful login and [`SessionStore::end`] on logout. Consumers either read
//! [`SessionStore::current`] or watch for changes with
//! [`SessionStore::subscribe`]; nothing reads identity from ambient storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

/// Identity of the authenticated user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub username: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl SessionContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            user_id: None,
            username: username.into(),
            token: None,
        }
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub type SharedSession = Option<Arc<SessionContext>>;

/// Holder of the current session.
pub struct SessionStore {
    tx: watch::Sender<SharedSession>,
}

static GLOBAL_SESSIONS: OnceLock<SessionStore> = OnceLock::new();

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// The process-wide store.
    pub fn global() -> &'static SessionStore {
        GLOBAL_SESSIONS.get_or_init(SessionStore::new)
    }

    /// Starts a session, replacing any previous one.
    pub fn begin(&self, session: SessionContext) -> Arc<SessionContext> {
        let session = Arc::new(session);
        tracing::info!("Session started for {}", session.username);
        self.tx.send_replace(Some(Arc::clone(&session)));
        session
    }

    /// Ends the current session. Returns the session that was active, if any.
    pub fn end(&self) -> SharedSession {
        let previous = self.tx.send_replace(None);
        if let Some(session) = &previous {
            tracing::info!("Session ended for {}", session.username);
        }
        previous
    }

    pub fn current(&self) -> SharedSession {
        self.tx.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<SharedSession> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new();
        assert!(!store.is_active());

        store.begin(SessionContext::new("alice").with_user_id(1));
        assert!(store.is_active());
        assert_eq!(store.current().unwrap().username, "alice");

        let ended = store.end().unwrap();
        assert_eq!(ended.user_id, Some(1));
        assert!(store.current().is_none());
        assert!(store.end().is_none());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.begin(SessionContext::new("bob"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().username, "bob");
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = SessionContext::new("alice").with_token("jwt-value");
        let debug = format!("{:?}", session);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("jwt-value"));
    }

    #[test]
    fn test_global_store_is_shared() {
        assert!(std::ptr::eq(SessionStore::global(), SessionStore::global()));
    }
}
