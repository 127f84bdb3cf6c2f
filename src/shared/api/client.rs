// src/shared/api/client.rs
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::application::services::session_context::SessionContext;
use crate::shared::api::error::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Carries the session's bearer token; a 401 tears the session down.
    Bearer,
    /// Login/registration: no token, and a 401 only means bad credentials.
    Public,
}

/// Thin wrapper over `reqwest` shared by every backend adapter.
///
/// No request timeout is configured: a hung request stays pending until the
/// transport itself gives up.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    session: SessionContext,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.session.is_authenticated())
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Result<Self, RemoteError> {
        let http = HttpClient::builder()
            .build()
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let response = self
            .dispatch(self.http.get(self.url(path)), Access::Bearer)
            .await?;
        Self::read_json(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .dispatch(self.http.post(self.url(path)).json(body), Access::Bearer)
            .await?;
        Self::read_json(response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .dispatch(self.http.put(self.url(path)).json(body), Access::Bearer)
            .await?;
        Self::read_json(response).await
    }

    /// PUT whose response body is ignored.
    pub async fn put_discarding<B>(&self, path: &str, body: &B) -> Result<(), RemoteError>
    where
        B: Serialize + ?Sized,
    {
        self.dispatch(self.http.put(self.url(path)).json(body), Access::Bearer)
            .await
            .map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> Result<(), RemoteError> {
        self.dispatch(self.http.delete(self.url(path)), Access::Bearer)
            .await
            .map(|_| ())
    }

    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .dispatch(self.http.post(self.url(path)).json(body), Access::Public)
            .await?;
        Self::read_json(response).await
    }

    async fn dispatch(&self, request: RequestBuilder, access: Access) -> Result<Response, RemoteError> {
        let request = match (access, self.session.access_token()) {
            (Access::Bearer, Some(token)) => request.bearer_auth(token),
            _ => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        tracing::debug!("Backend answered {}: {}", status, message);

        Err(match status {
            StatusCode::UNAUTHORIZED => {
                if access == Access::Bearer {
                    self.session.teardown("backend answered 401 Unauthorized");
                }
                RemoteError::Unauthorized
            }
            StatusCode::FORBIDDEN => RemoteError::Forbidden,
            StatusCode::NOT_FOUND => RemoteError::NotFound,
            other => RemoteError::Rejected {
                status: other.as_u16(),
                message,
            },
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }
}
