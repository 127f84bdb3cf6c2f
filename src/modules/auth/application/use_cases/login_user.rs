use async_trait::async_trait;
use tracing::{info, warn};

use crate::auth::application::domain::credentials::{Credentials, CredentialsError};
use crate::auth::application::domain::entities::{Session, SessionUser};
use crate::auth::application::ports::outgoing::{AuthApi, AuthApiError};
use crate::auth::application::services::SessionContext;

// ====================== Login Error =============================
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("{0}")]
    InvalidRequest(#[from] CredentialsError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Login rejected: {0}")]
    Rejected(String),

    #[error("Authentication service unavailable: {0}")]
    Unreachable(String),

    #[error("Could not cache the session: {0}")]
    SessionPersistence(String),
}

impl From<AuthApiError> for LoginError {
    fn from(err: AuthApiError) -> Self {
        match err {
            AuthApiError::InvalidCredentials => LoginError::InvalidCredentials,
            AuthApiError::Rejected(msg) => LoginError::Rejected(msg),
            AuthApiError::Unreachable(msg) => LoginError::Unreachable(msg),
        }
    }
}

// ====================== Use Case =============================
#[async_trait]
pub trait ILoginUserUseCase: Send + Sync {
    async fn execute(&self, email: String, password: String) -> Result<Session, LoginError>;
}

pub struct LoginUserUseCase<A>
where
    A: AuthApi,
{
    auth_api: A,
    session: SessionContext,
}

impl<A> LoginUserUseCase<A>
where
    A: AuthApi,
{
    pub fn new(auth_api: A, session: SessionContext) -> Self {
        Self { auth_api, session }
    }
}

#[async_trait]
impl<A> ILoginUserUseCase for LoginUserUseCase<A>
where
    A: AuthApi + Send + Sync,
{
    async fn execute(&self, email: String, password: String) -> Result<Session, LoginError> {
        // Validation happens before any network call.
        let credentials = Credentials::new(email, password)?;

        let response = self.auth_api.login(credentials).await.map_err(|e| {
            warn!("Login failed: {}", e);
            LoginError::from(e)
        })?;

        let session = Session {
            access_token: response.access_token,
            user: SessionUser {
                user_id: response.user_id,
                email: response.email,
                expires_in: response.expires_in,
            },
        };

        self.session
            .establish(session.clone())
            .map_err(|e| LoginError::SessionPersistence(e.to_string()))?;

        info!("User {} logged in", session.user.user_id);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::application::domain::entities::{RegisteredUser, UserId};
    use crate::auth::application::ports::outgoing::LoginResponse;
    use crate::shared::storage::{KeyValueStore, MemoryStore};
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        pub AuthApiMock {}
        #[async_trait]
        impl AuthApi for AuthApiMock {
            async fn login(&self, credentials: Credentials) -> Result<LoginResponse, AuthApiError>;
            async fn register(&self, credentials: Credentials) -> Result<RegisteredUser, AuthApiError>;
        }
    }

    fn session_context() -> (SessionContext, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionContext::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_login_success_establishes_session() {
        let mut api = MockAuthApiMock::new();
        api.expect_login()
            .withf(|c| c.email() == "ada@example.com" && c.password() == "secret")
            .times(1)
            .returning(|_| {
                Ok(LoginResponse {
                    access_token: "jwt-123".to_string(),
                    email: "ada@example.com".to_string(),
                    user_id: UserId::from(42),
                    expires_in: Some(86400),
                })
            });
        let (session, store) = session_context();
        let use_case = LoginUserUseCase::new(api, session.clone());

        let result = use_case
            .execute("Ada@Example.com".to_string(), "secret".to_string())
            .await;

        assert!(result.is_ok(), "Expected login success, got {:?}", result);
        assert_eq!(session.user_id(), Some(UserId::from(42)));
        assert_eq!(store.get("token").unwrap().as_deref(), Some("jwt-123"));
    }

    #[tokio::test]
    async fn test_login_invalid_email_never_calls_backend() {
        let mut api = MockAuthApiMock::new();
        api.expect_login().times(0);
        let (session, _) = session_context();
        let use_case = LoginUserUseCase::new(api, session.clone());

        let result = use_case
            .execute("nope".to_string(), "secret".to_string())
            .await;

        assert!(matches!(
            result,
            Err(LoginError::InvalidRequest(CredentialsError::InvalidEmailFormat))
        ));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_bad_credentials_leaves_session_signed_out() {
        let mut api = MockAuthApiMock::new();
        api.expect_login()
            .times(1)
            .returning(|_| Err(AuthApiError::InvalidCredentials));
        let (session, store) = session_context();
        let use_case = LoginUserUseCase::new(api, session.clone());

        let result = use_case
            .execute("ada@example.com".to_string(), "wrong".to_string())
            .await;

        assert_eq!(result, Err(LoginError::InvalidCredentials));
        assert!(!session.is_authenticated());
        assert!(store.keys().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_unreachable_backend() {
        let mut api = MockAuthApiMock::new();
        api.expect_login()
            .returning(|_| Err(AuthApiError::Unreachable("connection refused".into())));
        let (session, _) = session_context();
        let use_case = LoginUserUseCase::new(api, session);

        let result = use_case
            .execute("ada@example.com".to_string(), "secret".to_string())
            .await;

        assert!(matches!(result, Err(LoginError::Unreachable(msg)) if msg == "connection refused"));
    }
}
