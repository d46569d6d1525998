//! Session state store.
//!
//! Holds the authenticated identity and its token. The state machine is
//! `Anonymous -> (login/register ok) -> Authenticated -> (logout) -> Anonymous`;
//! a failed attempt never changes the identity.
//!
//! `is_authenticated` means "a token is present" and `is_admin` means "the
//! identity's role is ADMIN". Neither is re-validated against the server:
//! they drive the UI, the server enforces authorization.

use std::future::Future;

use secrecy::SecretString;
use sweet_shop_core::{Credentials, OperationStatus, Registration, SessionIdentity};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ApiError, StoreError};
use crate::gateway::{IdentityGateway, TokenSource};
use crate::persistence::SessionPersistence;

const REGISTER_FAILED: &str = "Registration failed";
const LOGIN_FAILED: &str = "Login failed";

/// Snapshot of the session store.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub identity: Option<SessionIdentity>,
    pub status: OperationStatus,
}

impl SessionState {
    /// A full identity is held. A persisted token without its user record
    /// never hydrates, so it does not count.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().is_some_and(SessionIdentity::is_admin)
    }
}

/// Owner of the session identity.
///
/// Every state change is published to [`SessionStore::subscribe`] receivers.
pub struct SessionStore<G, P> {
    gateway: G,
    persistence: P,
    state: watch::Sender<SessionState>,
}

impl<G, P> SessionStore<G, P>
where
    G: IdentityGateway,
    P: SessionPersistence,
{
    /// Create the store, restoring any persisted session.
    ///
    /// A persisted session that cannot be read is discarded.
    pub fn new(gateway: G, persistence: P) -> Self {
        let identity = match persistence.load() {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted session");
                if let Err(e) = persistence.clear() {
                    warn!(error = %e, "Failed to clear persisted session");
                }
                None
            }
        };

        if let Some(identity) = &identity {
            debug!(username = %identity.username, role = %identity.role, "Restored persisted session");
        }

        let (state, _) = watch::channel(SessionState {
            identity,
            status: OperationStatus::default(),
        });

        Self {
            gateway,
            persistence,
            state,
        }
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` with the server's message (or "Registration
    /// failed"); the same message is recorded in `last_error`.
    pub async fn register(&self, registration: &Registration) -> Result<SessionIdentity, StoreError> {
        self.authenticate(self.gateway.register(registration), REGISTER_FAILED)
            .await
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` with the server's message (or "Login failed");
    /// the same message is recorded in `last_error`.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionIdentity, StoreError> {
        self.authenticate(self.gateway.login(credentials), LOGIN_FAILED)
            .await
    }

    async fn authenticate(
        &self,
        request: impl Future<Output = Result<SessionIdentity, ApiError>>,
        fallback: &str,
    ) -> Result<SessionIdentity, StoreError> {
        self.state.send_modify(|s| s.status.begin());

        match request.await {
            Ok(identity) => {
                if let Err(e) = self.persistence.save(&identity) {
                    warn!(error = %e, "Failed to persist session; it will not survive a restart");
                }
                info!(username = %identity.username, role = %identity.role, "Signed in");

                let signed_in = identity.clone();
                self.state.send_modify(|s| {
                    s.identity = Some(signed_in);
                    s.status.succeed();
                });
                Ok(identity)
            }
            Err(source) => {
                let err = StoreError::new(fallback, source);
                warn!(error = %err.api_error(), "{}", err.message());
                self.state.send_modify(|s| s.status.fail(err.message()));
                Err(err)
            }
        }
    }

    /// Forget the identity, its token, any error, and the persisted copy.
    pub fn logout(&self) {
        if let Err(e) = self.persistence.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        self.state.send_modify(|s| {
            if let Some(identity) = s.identity.take() {
                info!(username = %identity.username, "Signed out");
            }
            s.status.clear_error();
        });
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.status.clear_error());
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    #[must_use]
    pub fn identity(&self) -> Option<SessionIdentity> {
        self.state.borrow().identity.clone()
    }

    #[must_use]
    pub fn status(&self) -> OperationStatus {
        self.state.borrow().status.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Token source that follows this session, for the catalog gateway.
    #[must_use]
    pub fn token_source(&self) -> SessionTokens {
        SessionTokens(self.state.subscribe())
    }
}

/// Live view of the session's bearer token.
#[derive(Debug, Clone)]
pub struct SessionTokens(watch::Receiver<SessionState>);

impl TokenSource for SessionTokens {
    fn bearer_token(&self) -> Option<SecretString> {
        self.0
            .borrow()
            .identity
            .as_ref()
            .map(|identity| identity.token.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use reqwest::StatusCode;
    use secrecy::ExposeSecret;
    use sweet_shop_core::Role;

    use super::*;
    use crate::persistence::{MemoryPersistence, TOKEN_KEY, USER_KEY};

    /// Accepts `admin`/`secret` and `bob`/`pass`; everything else is rejected.
    struct FakeIdentity;

    impl IdentityGateway for FakeIdentity {
        async fn register(&self, registration: &Registration) -> Result<SessionIdentity, ApiError> {
            if registration.username == "admin" {
                return Err(ApiError::from_response(
                    StatusCode::CONFLICT,
                    r#"{"error":"Username already exists"}"#,
                ));
            }
            Ok(SessionIdentity {
                username: registration.username.clone(),
                email: Some(registration.email.clone()),
                role: Role::Customer,
                token: SecretString::from(format!("token-{}", registration.username)),
                expires_in_ms: None,
            })
        }

        async fn login(&self, credentials: &Credentials) -> Result<SessionIdentity, ApiError> {
            let role = match (
                credentials.username.as_str(),
                credentials.password.expose_secret(),
            ) {
                ("admin", "secret") => Role::Admin,
                ("bob", "pass") => Role::Customer,
                ("flaky", _) => {
                    return Err(ApiError::from_response(StatusCode::BAD_GATEWAY, ""));
                }
                _ => {
                    return Err(ApiError::from_response(
                        StatusCode::UNAUTHORIZED,
                        r#"{"error":"Invalid username or password","status":"UNAUTHORIZED"}"#,
                    ));
                }
            };
            Ok(SessionIdentity {
                username: credentials.username.clone(),
                email: None,
                role,
                token: SecretString::from(format!("token-{}", credentials.username)),
                expires_in_ms: None,
            })
        }
    }

    fn store() -> SessionStore<FakeIdentity, Arc<MemoryPersistence>> {
        SessionStore::new(FakeIdentity, Arc::new(MemoryPersistence::new()))
    }

    #[tokio::test]
    async fn test_starts_anonymous() {
        let store = store();
        assert!(!store.is_authenticated());
        assert!(!store.is_admin());
        assert_eq!(store.status(), OperationStatus::default());
    }

    #[tokio::test]
    async fn test_login_as_admin() {
        let store = store();
        let identity = store
            .login(&Credentials::new("admin", "secret"))
            .await
            .unwrap();

        assert_eq!(identity.username, "admin");
        assert!(store.is_authenticated());
        assert!(store.is_admin());
        assert!(!store.status().pending);
        assert_eq!(
            store.token_source().bearer_token().unwrap().expose_secret(),
            "token-admin"
        );
    }

    #[tokio::test]
    async fn test_wrong_password_stays_anonymous() {
        let store = store();
        let err = store
            .login(&Credentials::new("admin", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Invalid username or password");
        assert_eq!(
            store.status().last_error.as_deref(),
            Some("Invalid username or password")
        );
        assert!(!store.status().pending);
        assert!(!store.is_authenticated());
        assert!(!store.is_admin());
        assert!(store.token_source().bearer_token().is_none());
    }

    #[tokio::test]
    async fn test_login_failure_without_message_uses_fallback() {
        let store = store();
        let err = store
            .login(&Credentials::new("flaky", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Login failed");
    }

    #[tokio::test]
    async fn test_failed_login_keeps_existing_identity() {
        let store = store();
        store.login(&Credentials::new("bob", "pass")).await.unwrap();
        store
            .login(&Credentials::new("admin", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(store.identity().unwrap().username, "bob");
        assert!(store.status().last_error.is_some());
    }

    #[tokio::test]
    async fn test_register_signs_in_customer() {
        let store = store();
        let identity = store
            .register(&Registration::new("carol", "carol@sweetshop.test", "pw"))
            .await
            .unwrap();

        assert_eq!(identity.role, Role::Customer);
        assert!(store.is_authenticated());
        assert!(!store.is_admin());
    }

    #[tokio::test]
    async fn test_register_conflict_surfaces_server_message() {
        let store = store();
        let err = store
            .register(&Registration::new("admin", "a@sweetshop.test", "pw"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Username already exists");
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_session_survives_reload() {
        let storage = Arc::new(MemoryPersistence::new());
        let first = SessionStore::new(FakeIdentity, Arc::clone(&storage));
        first
            .login(&Credentials::new("admin", "secret"))
            .await
            .unwrap();

        let reloaded = SessionStore::new(FakeIdentity, Arc::clone(&storage));
        assert!(reloaded.is_authenticated());
        assert!(reloaded.is_admin());
        assert_eq!(reloaded.identity().unwrap().username, "admin");
    }

    #[tokio::test]
    async fn test_logout_clears_memory_and_storage() {
        let storage = Arc::new(MemoryPersistence::new());
        let store = SessionStore::new(FakeIdentity, Arc::clone(&storage));
        store.login(&Credentials::new("bob", "pass")).await.unwrap();
        store
            .login(&Credentials::new("bob", "nope"))
            .await
            .unwrap_err();

        store.logout();

        assert!(!store.is_authenticated());
        assert_eq!(store.status().last_error, None);
        assert!(storage.entry(TOKEN_KEY).is_none());
        assert!(storage.entry(USER_KEY).is_none());
        assert!(SessionStore::new(FakeIdentity, storage).identity().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_persisted_session_is_discarded() {
        let storage = Arc::new(MemoryPersistence::new());
        storage.set_entry(USER_KEY, "{oops");
        storage.set_entry(TOKEN_KEY, "token");

        let store = SessionStore::new(FakeIdentity, Arc::clone(&storage));
        assert!(!store.is_authenticated());
        assert!(storage.entry(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_lone_persisted_token_is_anonymous() {
        let storage = Arc::new(MemoryPersistence::new());
        storage.set_entry(TOKEN_KEY, "orphan-token");

        let store = SessionStore::new(FakeIdentity, storage);
        assert!(!store.is_authenticated());
        assert!(store.identity().is_none());
        assert!(store.token_source().bearer_token().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let store = store();
        let mut changes = store.subscribe();

        store.login(&Credentials::new("bob", "pass")).await.unwrap();
        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_authenticated());

        store.logout();
        assert!(changes.has_changed().unwrap());
        assert!(!changes.borrow_and_update().is_authenticated());
    }
}
