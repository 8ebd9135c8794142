//! Operator session store.
//!
//! The session is only ever replaced as a whole. Mutation goes through the
//! closed [`Action`] set and the pure [`reduce`] function; readers get full
//! snapshots and never observe a half-applied update.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Shortest key that can pass the authorization gate.
pub const MIN_KEY_LEN: usize = 6;

/// Operator authentication identity.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_login: bool,
    pub key: String,
    pub name: String,
}

impl Session {
    pub fn new(is_login: bool, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_login,
            key: key.into(),
            name: name.into(),
        }
    }

    /// Authorization gate: logged in and the key is long enough.
    ///
    /// A short key fails the gate whatever `is_login` says.
    pub fn is_authenticated(&self) -> bool {
        self.is_login && self.key.chars().count() >= MIN_KEY_LEN
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("is_login", &self.is_login)
            .field("key", &Redacted(&self.key))
            .field("name", &self.name)
            .finish()
    }
}

/// Debug helper that shows only the length of a secret.
pub(crate) struct Redacted<'a>(pub &'a str);

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} chars>", self.0.chars().count())
    }
}

/// Session actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the whole session.
    UpdateSession(Session),
    /// Log the current session; state is unchanged.
    Inspect,
}

/// Apply `action` to `state`.
pub fn reduce(state: &Session, action: Action) -> Session {
    match action {
        Action::UpdateSession(next) => next,
        Action::Inspect => {
            tracing::debug!(session = ?state, "session inspected");
            state.clone()
        }
    }
}

/// Shared session store.
///
/// Cloning is cheap and every clone sees the same session; hand one to each
/// screen that needs it.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl SessionStore {
    /// Store starting from `initial`.
    pub fn new(initial: Session) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current session.
    pub fn read(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Replace the session with `{is_login, key, name}`.
    pub fn update(&self, is_login: bool, key: impl Into<String>, name: impl Into<String>) {
        self.dispatch(Action::UpdateSession(Session::new(is_login, key, name)));
    }

    /// Run `action` through [`reduce`] and publish the result.
    pub fn dispatch(&self, action: Action) {
        self.tx.send_modify(|state| {
            let next = reduce(state, action);
            tracing::debug!(is_login = next.is_login, name = %next.name, "session updated");
            *state = next;
        });
    }

    /// Shorthand for `read().is_authenticated()`.
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    /// Receiver that is notified on every update.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Session::default())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionStore").field(&*self.tx.borrow()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_is_signed_out() {
        let store = SessionStore::default();
        assert_eq!(store.read(), Session::default());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_update_replaces_whole_session() {
        let store = SessionStore::default();
        store.update(true, "abcdef", "Alice");
        store.update(false, "", "Bob");

        // Nothing from the first update survives.
        assert_eq!(store.read(), Session::new(false, "", "Bob"));
    }

    #[test]
    fn test_read_after_update_is_exact() {
        let store = SessionStore::default();
        for (is_login, key, name) in [
            (true, "abc123", "Alice"),
            (false, "xyz", ""),
            (true, "", "Nobody"),
            (true, "ключ-доступа", "Оператор"),
        ] {
            store.update(is_login, key, name);
            assert_eq!(store.read(), Session::new(is_login, key, name));
        }
    }

    #[test]
    fn test_short_keys_never_authenticate() {
        for key in ["", "a", "abcd", "abcde"] {
            assert!(!Session::new(true, key, "x").is_authenticated(), "{key}");
            assert!(!Session::new(false, key, "x").is_authenticated(), "{key}");
        }
        assert!(Session::new(true, "abcdef", "x").is_authenticated());
        assert!(!Session::new(false, "abcdef", "x").is_authenticated());
    }

    #[test]
    fn test_key_length_counts_chars() {
        // Six chars, twelve bytes.
        assert!(Session::new(true, "ключик", "x").is_authenticated());
        assert!(!Session::new(true, "ключ", "x").is_authenticated());
    }

    #[test]
    fn test_reduce_inspect_is_identity() {
        let state = Session::new(true, "abc123", "Alice");
        assert_eq!(reduce(&state, Action::Inspect), state);
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::default();
        let screen = store.clone();
        store.update(true, "abc123", "Alice");
        assert_eq!(screen.read().name, "Alice");
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = SessionStore::default();
        let mut rx = store.subscribe();

        store.update(true, "abc123", "Alice");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().key, "abc123");
    }

    #[test]
    fn test_debug_redacts_key() {
        let out = format!("{:?}", Session::new(true, "supersecret", "Alice"));
        assert!(!out.contains("supersecret"));
        assert!(out.contains("<11 chars>"));
    }

    #[test]
    fn test_session_json_shape() {
        let json = serde_json::to_value(Session::new(true, "abc123", "Alice")).unwrap();
        assert_eq!(json, serde_json::json!({"isLogin": true, "key": "abc123", "name": "Alice"}));
    }
}
