//! Session resolution
//!
//! [`SessionResolver`] is the single owner of the in-memory session for a
//! running app instance. It reads through to a [`SessionStore`] and publishes
//! every state change on a `watch` channel so route guards can re-evaluate.

use crate::auth::models::{ProfileUpdate, Session, Token, UserRecord};
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, SessionStore};
use serde::Serialize;
use std::fmt;
use tokio::sync::{watch, Mutex};

/// Observable lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Uninitialized,
    Loading,
    Authenticated,
    Unauthenticated,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Uninitialized => write!(f, "uninitialized"),
            SessionStatus::Loading => write!(f, "loading"),
            SessionStatus::Authenticated => write!(f, "authenticated"),
            SessionStatus::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// Snapshot of the session as seen by consumers.
///
/// `is_authenticated()` holds exactly when both a token and a user are present;
/// they are stored as one [`Session`] so neither can exist alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    session: Option<Session>,
    phase: Phase,
}

impl SessionState {
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn loading() -> Self {
        Self {
            session: None,
            phase: Phase::Loading,
        }
    }

    pub fn authenticated(session: Session) -> Self {
        Self {
            session: Some(session),
            phase: Phase::Ready,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            session: None,
            phase: Phase::Ready,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match (self.phase, &self.session) {
            (Phase::Uninitialized, _) => SessionStatus::Uninitialized,
            (Phase::Loading, _) => SessionStatus::Loading,
            (Phase::Ready, Some(_)) => SessionStatus::Authenticated,
            (Phase::Ready, None) => SessionStatus::Unauthenticated,
        }
    }

    /// True until the first load has finished
    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Ready
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn token(&self) -> Option<&Token> {
        self.session.as_ref().map(Session::token)
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.session.as_ref().map(Session::user)
    }
}

/// Loads, replaces and clears the persisted session.
///
/// Mutating operations are serialized internally, so a `logout` racing a
/// `login` cannot land between the clear and write phases.
pub struct SessionResolver<S> {
    store: SessionStore<S>,
    state: watch::Sender<SessionState>,
    ops: Mutex<()>,
}

impl<S> SessionResolver<S> {
    /// Current session snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }
}

impl<S: KeyValueStore> SessionResolver<S> {
    pub fn new(store: SessionStore<S>) -> Self {
        let (state, _) = watch::channel(SessionState::uninitialized());
        Self {
            store,
            state,
            ops: Mutex::new(()),
        }
    }

    /// Populate the session from the store.
    ///
    /// Never fails: an unreadable store is logged and treated as logged out.
    pub async fn load(&self) -> SessionState {
        let _guard = self.ops.lock().await;
        self.state.send_replace(SessionState::loading());
        tracing::debug!("Loading session from store");

        let next = self.read_stored().await;
        self.state.send_replace(next.clone());
        next
    }

    async fn read_stored(&self) -> SessionState {
        let (token, user) = tokio::join!(self.store.token(), self.store.user());
        match (token, user) {
            (Ok(Some(token)), Ok(Some(user))) => {
                tracing::info!(user_id = user.id, email = %user.email, "Session restored");
                SessionState::authenticated(Session::new(token, user))
            }
            (Ok(token), Ok(user)) => {
                if token.is_some() != user.is_some() {
                    tracing::warn!("Stored session is incomplete, ignoring it");
                } else {
                    tracing::debug!("No stored session");
                }
                SessionState::unauthenticated()
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Failed to read session from store: {}", e);
                SessionState::unauthenticated()
            }
        }
    }

    /// Bring the in-memory state back in line with a store that a failed
    /// clear may have left half-emptied.
    async fn reconcile_after_failed_clear(&self) {
        let next = self.read_stored().await;
        if !next.is_authenticated() && self.state.borrow().is_authenticated() {
            tracing::warn!("Session only partially cleared, treating as logged out");
        }
        self.state.send_replace(next);
    }

    /// Replace any existing session with `token` and `user`.
    ///
    /// The store is cleared before anything is written. If writing fails the
    /// store is cleared again and the state is left unauthenticated.
    pub async fn login(&self, token: Token, user: UserRecord) -> Result<()> {
        if token.is_empty() {
            return Err(Error::InvalidSession("token must not be empty".to_string()));
        }

        let _guard = self.ops.lock().await;
        tracing::debug!(user_id = user.id, "Logging in");

        if let Err(e) = self.store.clear().await {
            tracing::error!("Failed to clear previous session: {}", e);
            self.reconcile_after_failed_clear().await;
            return Err(e);
        }
        self.state.send_replace(SessionState::unauthenticated());

        let written = tokio::try_join!(self.store.save_token(&token), self.store.save_user(&user));
        if let Err(e) = written {
            tracing::error!("Failed to persist session: {}", e);
            if let Err(clear_err) = self.store.clear().await {
                tracing::warn!("Failed to roll back partial session: {}", clear_err);
            }
            return Err(e);
        }

        tracing::info!(
            user_id = user.id,
            email = %user.email,
            role = user.role.as_deref().unwrap_or("-"),
            "Logged in"
        );
        self.state
            .send_replace(SessionState::authenticated(Session::new(token, user)));
        Ok(())
    }

    /// Clear the session. Logging out twice is a no-op.
    ///
    /// When clearing fails the error is returned and the state is re-read from
    /// the store: it stays authenticated only if both token and user survived.
    pub async fn logout(&self) -> Result<()> {
        let _guard = self.ops.lock().await;

        if let Err(e) = self.store.clear().await {
            tracing::error!("Failed to clear session: {}", e);
            self.reconcile_after_failed_clear().await;
            return Err(e);
        }

        let was_authenticated = self.state.borrow().is_authenticated();
        self.state.send_replace(SessionState::unauthenticated());
        if was_authenticated {
            tracing::info!("Logged out");
        }
        Ok(())
    }

    /// Merge `update` into the current user and persist the full record.
    ///
    /// Returns `Ok(None)` without touching the store when no session is active.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Option<UserRecord>> {
        let _guard = self.ops.lock().await;

        let current = self.state.borrow().session().cloned();
        let Some(mut session) = current else {
            tracing::debug!("No active session, ignoring profile update");
            return Ok(None);
        };

        session.user_mut().apply(&update);
        if let Err(e) = self.store.save_user(session.user()).await {
            tracing::error!("Failed to persist profile update: {}", e);
            return Err(e);
        }

        let user = session.user().clone();
        self.state.send_replace(SessionState::authenticated(session));
        tracing::info!(user_id = user.id, "Profile updated");
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageKeys, StoreOp};

    fn resolver() -> SessionResolver<MemoryStore> {
        SessionResolver::new(SessionStore::new(MemoryStore::new(), StorageKeys::default()))
    }

    fn customer() -> UserRecord {
        UserRecord::new(1, "ana@example.com")
            .with_name("Ana")
            .with_role("customer")
    }

    #[test]
    fn test_state_constructors() {
        assert_eq!(SessionState::default().status(), SessionStatus::Uninitialized);
        assert!(SessionState::default().is_loading());
        assert!(SessionState::loading().is_loading());
        assert!(!SessionState::unauthenticated().is_loading());
        assert!(!SessionState::unauthenticated().is_authenticated());

        let state = SessionState::authenticated(Session::new(Token::new("t"), customer()));
        assert!(state.is_authenticated());
        assert_eq!(state.token(), Some(&Token::new("t")));
    }

    #[tokio::test]
    async fn test_load_empty_store() {
        let resolver = resolver();
        let state = resolver.load().await;
        assert_eq!(state.status(), SessionStatus::Unauthenticated);
        assert!(state.token().is_none());
        assert!(state.user().is_none());
    }

    #[tokio::test]
    async fn test_login_then_load() {
        let resolver = resolver();
        resolver.login(Token::new("t-1"), customer()).await.unwrap();

        let state = resolver.load().await;
        assert!(state.is_authenticated());
        assert_eq!(state.token(), Some(&Token::new("t-1")));
        assert_eq!(state.user(), Some(&customer()));
    }

    #[tokio::test]
    async fn test_load_read_failure_is_unauthenticated() {
        let resolver = resolver();
        resolver.login(Token::new("t-1"), customer()).await.unwrap();
        resolver.store().backend().inject_fault(StoreOp::Get);

        let state = resolver.load().await;
        assert_eq!(state.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_token_without_user_is_not_a_session() {
        let resolver = resolver();
        resolver.store().save_token(&Token::new("orphan")).await.unwrap();

        let state = resolver.load().await;
        assert!(!state.is_authenticated());
        assert!(state.token().is_none());
    }

    #[tokio::test]
    async fn test_login_rejects_empty_token() {
        let resolver = resolver();
        let result = resolver.login(Token::new("  "), customer()).await;
        assert!(matches!(result, Err(Error::InvalidSession(_))));
        assert!(resolver.store().backend().is_empty().await);
    }

    #[tokio::test]
    async fn test_login_write_failure_rolls_back() {
        let resolver = resolver();
        resolver.load().await;
        resolver.store().backend().inject_fault(StoreOp::Set);

        let err = resolver.login(Token::new("t-1"), customer()).await.unwrap_err();
        assert!(err.is_write_failure());
        assert!(!resolver.state().is_authenticated());
        assert!(resolver.store().backend().is_empty().await);
    }

    #[tokio::test]
    async fn test_logout_clear_failure_keeps_session() {
        let resolver = resolver();
        resolver.login(Token::new("t-1"), customer()).await.unwrap();
        resolver.store().backend().inject_fault(StoreOp::Remove);

        assert!(resolver.logout().await.is_err());
        assert!(resolver.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_partial_clear_drops_session() {
        let resolver = resolver();
        resolver.login(Token::new("t-1"), customer()).await.unwrap();
        resolver.store().backend().inject_write_fault_for("@esculapi:user");

        let err = resolver.logout().await.unwrap_err();
        assert!(err.is_write_failure());
        assert_eq!(resolver.state().status(), SessionStatus::Unauthenticated);
        assert_eq!(resolver.store().backend().len().await, 1);
        assert!(resolver.store().backend().get("@esculapi:token").await.unwrap().is_none());

        assert!(!resolver.load().await.is_authenticated());
    }

    #[tokio::test]
    async fn test_update_profile_without_session() {
        let resolver = resolver();
        resolver.load().await;

        let updated = resolver
            .update_profile(ProfileUpdate::name("Nobody"))
            .await
            .unwrap();
        assert!(updated.is_none());
        assert!(resolver.store().backend().is_empty().await);
    }

    #[tokio::test]
    async fn test_update_profile_persists_full_record() {
        let resolver = resolver();
        resolver.login(Token::new("t-1"), customer()).await.unwrap();

        let updated = resolver
            .update_profile(ProfileUpdate::name("Ana Paula"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ana Paula"));
        assert_eq!(updated.role.as_deref(), Some("customer"));

        let stored = resolver.store().user().await.unwrap().unwrap();
        assert_eq!(stored, updated);
        assert_eq!(resolver.state().user(), Some(&updated));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let resolver = resolver();
        let mut rx = resolver.subscribe();

        resolver.login(Token::new("t-1"), customer()).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        resolver.logout().await.unwrap();
        assert!(!rx.borrow_and_update().is_authenticated());
    }
}
