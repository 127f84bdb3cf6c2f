use async_trait::async_trait;

use crate::auth::application::domain::credentials::{Credentials, CredentialsError};
use crate::auth::application::domain::entities::RegisteredUser;
use crate::auth::application::ports::outgoing::{AuthApi, AuthApiError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    #[error("{0}")]
    InvalidRequest(#[from] CredentialsError),

    #[error("Registration rejected: {0}")]
    Rejected(String),

    #[error("Registration is unavailable right now: {0}")]
    Unreachable(String),
}

impl From<AuthApiError> for RegisterError {
    fn from(err: AuthApiError) -> Self {
        match err {
            AuthApiError::InvalidCredentials => {
                RegisterError::Rejected("credentials refused".to_string())
            }
            AuthApiError::Rejected(msg) => RegisterError::Rejected(msg),
            AuthApiError::Unreachable(msg) => RegisterError::Unreachable(msg),
        }
    }
}

/// Creates an account. Does not log the user in.
#[async_trait]
pub trait IRegisterUserUseCase: Send + Sync {
    async fn execute(&self, email: String, password: String)
        -> Result<RegisteredUser, RegisterError>;
}

pub struct RegisterUserUseCase<A: AuthApi> {
    auth_api: A,
}

impl<A: AuthApi> RegisterUserUseCase<A> {
    pub fn new(auth_api: A) -> Self {
        Self { auth_api }
    }
}

#[async_trait]
impl<A: AuthApi + Send + Sync> IRegisterUserUseCase for RegisterUserUseCase<A> {
    async fn execute(
        &self,
        email: String,
        password: String,
    ) -> Result<RegisteredUser, RegisterError> {
        let credentials = Credentials::new(email, password)?;

        let user = self.auth_api.register(credentials).await?;
        tracing::info!("Registered account {}", user.email);
        Ok(user)
    }
}
