use async_trait::async_trait;
use serde::Serialize;

use crate::auth::application::domain::credentials::Credentials;
use crate::auth::application::domain::entities::RegisteredUser;
use crate::auth::application::ports::outgoing::{AuthApi, AuthApiError, LoginResponse};
use crate::shared::api::{ApiClient, RemoteError};

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

impl<'a> From<&'a Credentials> for CredentialsBody<'a> {
    fn from(c: &'a Credentials) -> Self {
        Self {
            email: c.email(),
            password: c.password(),
        }
    }
}

/// `AuthApi` over the backend's `/auth` endpoints.
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    client: ApiClient,
}

impl HttpAuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn map_error(err: RemoteError) -> AuthApiError {
        match err {
            RemoteError::Unauthorized | RemoteError::Forbidden => AuthApiError::InvalidCredentials,
            RemoteError::Rejected { message, status } if message.trim().is_empty() => {
                AuthApiError::Rejected(format!("status {status}"))
            }
            RemoteError::Rejected { message, .. } => AuthApiError::Rejected(message),
            RemoteError::NotFound => AuthApiError::Unreachable("auth endpoint not found".into()),
            RemoteError::Unreachable(msg) | RemoteError::InvalidResponse(msg) => {
                AuthApiError::Unreachable(msg)
            }
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: Credentials) -> Result<LoginResponse, AuthApiError> {
        self.client
            .post_public("auth/login", &CredentialsBody::from(&credentials))
            .await
            .map_err(Self::map_error)
    }

    async fn register(&self, credentials: Credentials) -> Result<RegisteredUser, AuthApiError> {
        self.client
            .post_public("auth/register", &CredentialsBody::from(&credentials))
            .await
            .map_err(Self::map_error)
    }
}
