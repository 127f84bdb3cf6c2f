use async_trait::async_trait;
use serde::Deserialize;

use crate::auth::application::domain::credentials::Credentials;
use crate::auth::application::domain::entities::{RegisteredUser, UserId};

/// Body of a successful `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub email: String,
    pub user_id: UserId,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthApiError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Authentication service unreachable: {0}")]
    Unreachable(String),
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: Credentials) -> Result<LoginResponse, AuthApiError>;

    async fn register(&self, credentials: Credentials) -> Result<RegisteredUser, AuthApiError>;
}
