//! Operator authentication flow.
//!
//! ```text
//!   Idle ──submit(non-empty key)──▶ Verifying ──ok──▶ Authenticated
//!    ▲                                  │
//!    └──────── error (flag set) ◀───────┘
//! ```
//!
//! The error flag clears as soon as the key is edited again. `Authenticated`
//! is terminal for the flow.

use crate::error::{Error, Result};
use crate::gateway::{reject_server_error, Command, Gateway, Param};
use crate::remember::{RememberRecord, RememberStore};
use crate::session::{Action, Redacted, Session, SessionStore};
use crate::types::CheckKeyReply;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Waiting for input; `error` marks a failed last attempt.
    Idle { error: bool },
    /// Key check in flight.
    Verifying,
    /// Session holds a validated (or remembered) key.
    Authenticated,
}

impl AuthState {
    pub fn is_error(&self) -> bool {
        matches!(self, AuthState::Idle { error: true })
    }
}

impl Default for AuthState {
    fn default() -> Self {
        AuthState::Idle { error: false }
    }
}

/// Login form driver.
///
/// `submit` borrows the flow mutably, so one flow never has two key checks
/// in flight.
pub struct AuthFlow {
    gateway: Arc<dyn Gateway>,
    session: SessionStore,
    remember_store: Arc<dyn RememberStore>,
    state: AuthState,
    key: String,
    remember: bool,
    verify_delay: Duration,
    revalidate_remembered: bool,
    last_error: Option<Error>,
}

impl AuthFlow {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        session: SessionStore,
        remember_store: Arc<dyn RememberStore>,
    ) -> Self {
        Self {
            gateway,
            session,
            remember_store,
            state: AuthState::default(),
            key: String::new(),
            remember: false,
            verify_delay: Duration::ZERO,
            revalidate_remembered: false,
            last_error: None,
        }
    }

    /// Pause before each key check.
    pub fn with_verify_delay(mut self, delay: Duration) -> Self {
        self.verify_delay = delay;
        self
    }

    /// Re-check remembered keys on mount instead of trusting them.
    pub fn with_revalidation(mut self, revalidate: bool) -> Self {
        self.revalidate_remembered = revalidate;
        self
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Key currently typed into the form.
    pub fn key_input(&self) -> &str {
        &self.key
    }

    pub fn remember_enabled(&self) -> bool {
        self.remember
    }

    /// Why the last attempt failed, while the error flag is up.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Restore a remembered login.
    ///
    /// A remembered key is trusted as-is: the session is marked logged in
    /// without asking the server, unless revalidation was enabled. A key
    /// revoked server-side since it was stored keeps working here until a
    /// command using it fails.
    pub async fn mount(&mut self) -> AuthState {
        let record = match self.remember_store.load() {
            Ok(Some(record)) if record.is_restorable() => record,
            Ok(_) => return self.state,
            Err(e) => {
                tracing::warn!(error = %e, "could not read remember-me record");
                return self.state;
            }
        };

        self.key = record.key.clone();
        self.remember = true;

        if self.revalidate_remembered {
            tracing::info!(name = %record.name, "re-checking remembered key");
            return self.submit().await;
        }

        tracing::warn!(name = %record.name, "restoring remembered key without server check");
        self.session.update(true, record.key, record.name);
        self.state = AuthState::Authenticated;
        self.state
    }

    /// Replace the typed key. Clears a pending error flag.
    pub fn edit_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
        if matches!(self.state, AuthState::Idle { error: true } | AuthState::Verifying) {
            self.state = AuthState::Idle { error: false };
            self.last_error = None;
        }
    }

    /// Toggle the remember-me switch.
    pub fn set_remember(&mut self, remember: bool) {
        self.remember = remember;
    }

    /// Check the typed key with the server.
    ///
    /// An empty key leaves the flow untouched. On success the session is
    /// replaced and the remember-me record written or cleared. On failure,
    /// including a key too short for the authorization gate, the session is
    /// left alone and the error flag raised.
    pub async fn submit(&mut self) -> AuthState {
        if self.state == AuthState::Authenticated || self.key.is_empty() {
            return self.state;
        }

        self.state = AuthState::Verifying;
        self.last_error = None;
        tracing::info!(key = ?Redacted(&self.key), "verifying access key");

        if !self.verify_delay.is_zero() {
            tokio::time::sleep(self.verify_delay).await;
        }

        match self.check_key().await.and_then(|reply| self.gated(reply)) {
            Ok(session) => {
                tracing::info!(name = %session.name, "access key accepted");
                self.persist(&session.name);
                self.session.dispatch(Action::UpdateSession(session));
                self.state = AuthState::Authenticated;
            }
            Err(e) => {
                tracing::warn!(error = %e, "access key rejected");
                self.last_error = Some(e);
                self.state = AuthState::Idle { error: true };
            }
        }

        self.state
    }

    async fn check_key(&self) -> Result<CheckKeyReply> {
        let params = [Param::access_key(&self.key), Param::new("path", "/")];
        let body = self.gateway.get(Command::CheckKey.as_str(), &params).await?;
        Ok(serde_json::from_value(reject_server_error(body)?)?)
    }

    /// Session the accepted key would produce, provided it passes the
    /// authorization gate. A short key is refused even when the server
    /// accepted it.
    fn gated(&self, reply: CheckKeyReply) -> Result<Session> {
        let session = Session::new(true, self.key.as_str(), reply.name);
        if session.is_authenticated() {
            Ok(session)
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    fn persist(&self, name: &str) {
        let result = if self.remember {
            self.remember_store
                .save(&RememberRecord::remembered(self.key.as_str(), name))
        } else {
            self.remember_store.clear()
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not write remember-me record");
        }
    }
}

impl fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthFlow")
            .field("state", &self.state)
            .field("key", &Redacted(&self.key))
            .field("remember", &self.remember)
            .finish_non_exhaustive()
    }
}
