use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::application::domain::entities::UserId;
use crate::modules::portfolio::application::ports::outgoing::{PortfolioApi, RemotePortfolio};
use crate::modules::portfolio::domain::entities::{
    BackendId, Education, EducationDraft, EntryId, Experience, ExperienceDraft,
};
use crate::shared::api::{ApiClient, RemoteError};

/// Portfolio as serialized by the backend. The backend does not store a
/// name yet, so it is optional here.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioBody {
    #[serde(default, alias = "idPort", alias = "idPortfolio")]
    id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    experiences: Option<Vec<Experience>>,
    #[serde(default)]
    educations: Option<Vec<Education>>,
}

impl TryFrom<PortfolioBody> for RemotePortfolio {
    type Error = RemoteError;

    fn try_from(body: PortfolioBody) -> Result<Self, Self::Error> {
        let backend_id = body.id.and_then(BackendId::new).ok_or_else(|| {
            RemoteError::InvalidResponse(format!("portfolio without a valid id: {:?}", body.id))
        })?;

        let mut portfolio = RemotePortfolio::new(backend_id, body.name);
        portfolio.experiences = body.experiences.unwrap_or_default();
        portfolio.educations = body.educations.unwrap_or_default();
        Ok(portfolio)
    }
}

#[derive(Serialize)]
struct PortfolioNameBody<'a> {
    name: &'a str,
}

/// `PortfolioApi` over the backend's `/portfolios`, `/experiences` and
/// `/educations` endpoints.
#[derive(Clone, Debug)]
pub struct HttpPortfolioApi {
    client: ApiClient,
}

impl HttpPortfolioApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PortfolioApi for HttpPortfolioApi {
    async fn fetch_user_portfolios(&self, user_id: UserId) -> Result<Vec<RemotePortfolio>, RemoteError> {
        let bodies: Vec<PortfolioBody> = self.client.get(&format!("portfolios/user/{user_id}")).await?;
        bodies.into_iter().map(RemotePortfolio::try_from).collect()
    }

    async fn create_portfolio(&self, user_id: UserId, name: &str) -> Result<RemotePortfolio, RemoteError> {
        let body: PortfolioBody = self
            .client
            .post(&format!("portfolios/{user_id}"), &PortfolioNameBody { name })
            .await?;
        let mut created = RemotePortfolio::try_from(body)?;
        created.name = name.to_string();
        Ok(created)
    }

    async fn update_portfolio(&self, portfolio_id: BackendId, name: &str) -> Result<(), RemoteError> {
        self.client
            .put_discarding(&format!("portfolios/{portfolio_id}"), &PortfolioNameBody { name })
            .await
    }

    async fn delete_portfolio(&self, portfolio_id: BackendId) -> Result<(), RemoteError> {
        self.client.delete(&format!("portfolios/{portfolio_id}")).await
    }

    async fn create_experience(
        &self,
        portfolio_id: BackendId,
        draft: &ExperienceDraft,
    ) -> Result<Experience, RemoteError> {
        self.client.post(&format!("experiences/{portfolio_id}"), draft).await
    }

    async fn update_experience(&self, id: EntryId, draft: &ExperienceDraft) -> Result<Experience, RemoteError> {
        self.client.put(&format!("experiences/{id}"), draft).await
    }

    async fn delete_experience(&self, id: EntryId) -> Result<(), RemoteError> {
        self.client.delete(&format!("experiences/{id}")).await
    }

    async fn create_education(
        &self,
        portfolio_id: BackendId,
        draft: &EducationDraft,
    ) -> Result<Education, RemoteError> {
        self.client.post(&format!("educations/{portfolio_id}"), draft).await
    }

    async fn update_education(&self, id: EntryId, draft: &EducationDraft) -> Result<Education, RemoteError> {
        self.client.put(&format!("educations/{id}"), draft).await
    }

    async fn delete_education(&self, id: EntryId) -> Result<(), RemoteError> {
        self.client.delete(&format!("educations/{id}")).await
    }
}
