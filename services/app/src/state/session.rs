//! services/app/src/state/session.rs
//!
//! Holds the bearer token, the resolved user, and the authentication flag
//! derived from them. Persists the token to the profile store and installs
//! it on the backend port synchronously, before any dependent request can
//! fire.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use doclens_core::domain::User;
use doclens_core::ports::{BackendService, ProfileStorage, TOKEN_KEY};

use super::lock;
use super::toasts::ToastQueue;

/// Read-only view of the session used by the render path.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub has_token: bool,
    /// True while a persisted token is being resolved into a user; protected
    /// views render a loading indicator instead of redirecting.
    pub loading: bool,
}

impl SessionSnapshot {
    /// Authenticated means a user is held; a token alone is not enough.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Default)]
struct SessionInner {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
}

pub struct SessionStore {
    backend: Arc<dyn BackendService>,
    storage: Arc<dyn ProfileStorage>,
    toasts: Arc<ToastQueue>,
    inner: Mutex<SessionInner>,
}

impl SessionStore {
    /// Restores a persisted token, if any, and installs it on the backend
    /// before anything else can issue a request. The caller is expected to
    /// follow up with [`SessionStore::resolve_user`].
    pub fn new(
        backend: Arc<dyn BackendService>,
        storage: Arc<dyn ProfileStorage>,
        toasts: Arc<ToastQueue>,
    ) -> Self {
        let token = storage.get(TOKEN_KEY);
        if let Some(token) = token.as_deref() {
            backend.set_bearer_token(Some(token));
        }

        Self {
            backend,
            storage,
            toasts,
            inner: Mutex::new(SessionInner {
                user: None,
                loading: token.is_some(),
                token,
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = lock(&self.inner);
        SessionSnapshot {
            user: inner.user.clone(),
            has_token: inner.token.is_some(),
            loading: inner.loading,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.inner).user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.inner).loading
    }

    /// Resolves the held token into a user via `/auth/me`.
    ///
    /// A failed resolution (expired or revoked token) clears token and user
    /// in one locked transition, so no reader ever observes an authenticated
    /// session with a missing user.
    pub async fn resolve_user(&self) {
        if lock(&self.inner).token.is_none() {
            lock(&self.inner).loading = false;
            return;
        }

        match self.backend.current_user().await {
            Ok(user) => {
                info!("session resolved for {}", user.email);
                let mut inner = lock(&self.inner);
                inner.user = Some(user);
                inner.loading = false;
            }
            Err(error) => {
                warn!("token resolution failed, clearing session: {error}");
                self.clear_session();
            }
        }
    }

    /// Exchanges credentials for a bearer token. Returns whether the
    /// exchange succeeded; on failure the session is untouched and nothing
    /// is persisted.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.backend.login(email, password).await {
            Ok(token) => {
                // Persist and install before the user fetch depends on it.
                if let Err(error) = self.storage.set(TOKEN_KEY, &token) {
                    warn!("failed to persist token: {error}");
                }
                self.backend.set_bearer_token(Some(&token));
                {
                    let mut inner = lock(&self.inner);
                    inner.token = Some(token);
                    inner.loading = true;
                }
                self.toasts.success("Signed in successfully");
                self.resolve_user().await;
                true
            }
            Err(error) => {
                let message = error
                    .detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| "Unable to sign in".to_string());
                self.toasts.error(message);
                false
            }
        }
    }

    /// Creates a new account. Does not sign the user in.
    pub async fn register(&self, email: &str, password: &str) -> bool {
        match self.backend.register(email, password).await {
            Ok(()) => {
                self.toasts.success("Account created. Please sign in.");
                true
            }
            Err(error) => {
                let message = error
                    .detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| "Unable to create the account".to_string());
                self.toasts.error(message);
                false
            }
        }
    }

    /// Clears the session unconditionally; no server round-trip.
    pub fn logout(&self) {
        self.clear_session();
        self.toasts.info("Signed out");
    }

    fn clear_session(&self) {
        {
            let mut inner = lock(&self.inner);
            inner.user = None;
            inner.token = None;
            inner.loading = false;
        }
        if let Err(error) = self.storage.remove(TOKEN_KEY) {
            warn!("failed to remove persisted token: {error}");
        }
        self.backend.set_bearer_token(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{MemoryStorage, StubBackend};
    use crate::state::toasts::ToastKind;
    use doclens_core::ports::PortError;

    fn store(backend: Arc<StubBackend>) -> (SessionStore, Arc<MemoryStorage>, Arc<ToastQueue>) {
        let storage = Arc::new(MemoryStorage::default());
        let toasts = Arc::new(ToastQueue::new());
        let session = SessionStore::new(backend, storage.clone(), toasts.clone());
        (session, storage, toasts)
    }

    #[tokio::test]
    async fn failed_login_leaves_no_session_and_no_token() {
        let backend = Arc::new(StubBackend::default());
        backend.queue_login(Err(PortError::Api("Invalid credentials".into())));
        let (session, storage, toasts) = store(backend);

        assert!(!session.login("a@b.c", "nope").await);

        let snapshot = session.snapshot();
        assert!(!snapshot.is_authenticated());
        assert!(!snapshot.has_token);
        assert_eq!(storage.get(TOKEN_KEY), None);

        let visible = toasts.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind, ToastKind::Error);
        assert_eq!(visible[0].message, "Invalid credentials");
    }

    #[tokio::test]
    async fn login_then_failed_user_fetch_rolls_back_atomically() {
        let backend = Arc::new(StubBackend::default());
        backend.queue_login(Ok("tok-1".into()));
        backend.queue_current_user(Err(PortError::Unauthorized));
        let (session, storage, _toasts) = store(backend.clone());

        session.login("a@b.c", "pw").await;

        let snapshot = session.snapshot();
        assert!(snapshot.user.is_none());
        assert!(!snapshot.has_token);
        assert!(!snapshot.loading);
        assert_eq!(storage.get(TOKEN_KEY), None);
        // The header was installed for the user fetch, then cleared again.
        assert_eq!(backend.last_token(), None);
    }

    #[tokio::test]
    async fn successful_login_resolves_the_user() {
        let backend = Arc::new(StubBackend::default());
        backend.queue_login(Ok("tok-1".into()));
        backend.queue_current_user(Ok(User {
            id: 7,
            email: "a@b.c".into(),
        }));
        let (session, storage, _toasts) = store(backend.clone());

        assert!(session.login("a@b.c", "pw").await);

        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated());
        assert!(snapshot.has_token);
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok-1"));
        assert_eq!(backend.last_token().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn persisted_token_is_installed_before_resolution() {
        let backend = Arc::new(StubBackend::default());
        let storage = Arc::new(MemoryStorage::default());
        storage.set(TOKEN_KEY, "persisted").unwrap();
        backend.queue_current_user(Ok(User {
            id: 1,
            email: "a@b.c".into(),
        }));

        let session = SessionStore::new(
            backend.clone(),
            storage.clone(),
            Arc::new(ToastQueue::new()),
        );
        // Token installed synchronously during construction.
        assert_eq!(backend.last_token().as_deref(), Some("persisted"));
        assert!(session.is_loading());

        session.resolve_user().await;
        assert!(session.is_authenticated());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn register_never_touches_the_session() {
        let backend = Arc::new(StubBackend::default());
        backend.queue_register(Ok(()));
        let (session, storage, toasts) = store(backend);

        assert!(session.register("a@b.c", "secret1").await);
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY), None);
        assert!(toasts
            .visible()
            .iter()
            .any(|toast| toast.kind == ToastKind::Success));
    }

    #[tokio::test]
    async fn logout_clears_everything_without_a_round_trip() {
        let backend = Arc::new(StubBackend::default());
        backend.queue_login(Ok("tok-1".into()));
        backend.queue_current_user(Ok(User {
            id: 7,
            email: "a@b.c".into(),
        }));
        let (session, storage, toasts) = store(backend.clone());
        session.login("a@b.c", "pw").await;

        session.logout();

        assert!(!session.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY), None);
        assert_eq!(backend.last_token(), None);
        assert!(toasts
            .visible()
            .iter()
            .any(|toast| toast.kind == ToastKind::Info));
    }
}
