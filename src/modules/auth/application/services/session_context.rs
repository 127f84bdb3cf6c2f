use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::auth::application::domain::entities::{Session, SessionState, SessionUser, UserId};
use crate::shared::storage::{KeyValueStore, StoreError};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Process-wide view of the authenticated session.
///
/// Cloning is cheap and every clone observes the same session. Whoever gets a
/// 401 from the backend calls [`SessionContext::teardown`]; subscribers are
/// notified so the UI can return to the login flow.
#[derive(Clone)]
pub struct SessionContext {
    current: Arc<RwLock<Option<Session>>>,
    store: Arc<dyn KeyValueStore>,
    state_tx: Arc<watch::Sender<SessionState>>,
}

impl SessionContext {
    /// Signed-out context. Nothing is read from the store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::SignedOut);
        Self {
            current: Arc::new(RwLock::new(None)),
            store,
            state_tx: Arc::new(state_tx),
        }
    }

    /// Rebuilds the session from the cached `token` and `user` keys.
    ///
    /// Both must be present and the user record must decode; anything else
    /// clears both keys and starts signed out.
    pub fn restore(store: Arc<dyn KeyValueStore>) -> Self {
        let context = Self::new(store);

        match context.read_cached() {
            Ok(Some(session)) => {
                info!("Restored cached session for user {}", session.user.user_id);
                context.set_current(Some(session));
                context.state_tx.send_replace(SessionState::Authenticated);
            }
            Ok(None) => {}
            Err(reason) => {
                warn!("Discarding cached session: {}", reason);
                context.clear_cache();
            }
        }

        context
    }

    fn read_cached(&self) -> Result<Option<Session>, String> {
        let token = self.store.get(TOKEN_KEY).map_err(|e| e.to_string())?;
        let user = self.store.get(USER_KEY).map_err(|e| e.to_string())?;

        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user)) => {
                let token = token.trim().to_string();
                if token.is_empty() {
                    return Err("empty token".to_string());
                }
                let user: SessionUser = serde_json::from_str(&user)
                    .map_err(|e| format!("invalid user record: {e}"))?;
                Ok(Some(Session {
                    access_token: token,
                    user,
                }))
            }
            _ => Err("token and user record must be cached together".to_string()),
        }
    }

    fn set_current(&self, session: Option<Session>) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = session;
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current().map(|s| s.access_token)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.current().map(|s| s.user_id())
    }

    /// Caches and activates a freshly issued session.
    pub fn establish(&self, session: Session) -> Result<(), StoreError> {
        let user = serde_json::to_string(&session.user).map_err(|e| StoreError::Io {
            key: USER_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.store.set(TOKEN_KEY, &session.access_token)?;
        self.store.set(USER_KEY, &user)?;

        info!("Session established for user {}", session.user.user_id);
        self.set_current(Some(session));
        self.state_tx.send_replace(SessionState::Authenticated);
        Ok(())
    }

    /// Forgets the session in memory and in the cache. Safe to call when
    /// already signed out.
    pub fn teardown(&self, reason: &str) {
        let was_authenticated = self.is_authenticated();
        self.set_current(None);
        self.clear_cache();

        if was_authenticated {
            warn!("Session torn down: {}", reason);
        }
        self.state_tx.send_replace(SessionState::SignedOut);
    }

    fn clear_cache(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::error!("Failed to clear cached '{}': {}", key, e);
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }
}
