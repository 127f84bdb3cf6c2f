use async_trait::async_trait;

use crate::auth::application::domain::entities::UserId;
use crate::modules::portfolio::domain::entities::{
    BackendId, Education, EducationDraft, EntryId, Experience, ExperienceDraft, Portfolio,
};
use crate::shared::api::RemoteError;

/// A portfolio as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePortfolio {
    pub backend_id: BackendId,
    pub name: String,
    pub experiences: Vec<Experience>,
    pub educations: Vec<Education>,
}

impl RemotePortfolio {
    pub fn new(backend_id: BackendId, name: Option<String>) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Portfolio {backend_id}"));
        Self {
            backend_id,
            name,
            experiences: Vec::new(),
            educations: Vec::new(),
        }
    }

    /// Skills and languages are not stored by the backend.
    pub fn into_portfolio(self) -> Portfolio {
        Portfolio {
            experiences: self.experiences,
            educations: self.educations,
            ..Portfolio::synced(self.backend_id, self.name)
        }
    }
}

#[async_trait]
pub trait PortfolioApi: Send + Sync {
    async fn fetch_user_portfolios(&self, user_id: UserId) -> Result<Vec<RemotePortfolio>, RemoteError>;

    async fn create_portfolio(&self, user_id: UserId, name: &str) -> Result<RemotePortfolio, RemoteError>;

    async fn update_portfolio(&self, portfolio_id: BackendId, name: &str) -> Result<(), RemoteError>;

    async fn delete_portfolio(&self, portfolio_id: BackendId) -> Result<(), RemoteError>;

    async fn create_experience(
        &self,
        portfolio_id: BackendId,
        draft: &ExperienceDraft,
    ) -> Result<Experience, RemoteError>;

    async fn update_experience(&self, id: EntryId, draft: &ExperienceDraft) -> Result<Experience, RemoteError>;

    async fn delete_experience(&self, id: EntryId) -> Result<(), RemoteError>;

    async fn create_education(
        &self,
        portfolio_id: BackendId,
        draft: &EducationDraft,
    ) -> Result<Education, RemoteError>;

    async fn update_education(&self, id: EntryId, draft: &EducationDraft) -> Result<Education, RemoteError>;

    async fn delete_education(&self, id: EntryId) -> Result<(), RemoteError>;
}
