use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::auth::application::domain::entities::UserId;
use crate::modules::portfolio::application::ports::outgoing::{PortfolioApi, RemotePortfolio};
use crate::modules::portfolio::domain::entities::{
    BackendId, Education, EducationDraft, EntryId, Experience, ExperienceDraft,
};
use crate::shared::api::RemoteError;
use crate::shared::storage::{KeyValueStore, MemoryStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchUserPortfolios(UserId),
    CreatePortfolio { user_id: UserId, name: String },
    UpdatePortfolio { id: BackendId, name: String },
    DeletePortfolio(BackendId),
    CreateExperience(BackendId),
    UpdateExperience(EntryId),
    DeleteExperience(EntryId),
    CreateEducation(BackendId),
    UpdateEducation(EntryId),
    DeleteEducation(EntryId),
}

struct FakeState {
    portfolios: Vec<RemotePortfolio>,
    next_id: i64,
    calls: Vec<ApiCall>,
    failure: Option<RemoteError>,
}

/// In-memory backend that records every call it receives.
pub struct FakePortfolioApi {
    state: Mutex<FakeState>,
}

impl Default for FakePortfolioApi {
    fn default() -> Self {
        Self::with_portfolios(Vec::new())
    }
}

impl FakePortfolioApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_portfolios(portfolios: Vec<RemotePortfolio>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                portfolios,
                next_id: 900,
                calls: Vec::new(),
                failure: None,
            }),
        }
    }

    /// Every later call fails with `err`.
    pub fn fail_with(&self, err: RemoteError) {
        self.state.lock().unwrap().failure = Some(err);
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().failure = None;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn remote_portfolios(&self) -> Vec<RemotePortfolio> {
        self.state.lock().unwrap().portfolios.clone()
    }

    fn call<T>(&self, call: ApiCall, op: impl FnOnce(&mut FakeState) -> Result<T, RemoteError>) -> Result<T, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(err) = state.failure.clone() {
            return Err(err);
        }
        op(&mut state)
    }
}

impl FakeState {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn portfolio_mut(&mut self, id: BackendId) -> Result<&mut RemotePortfolio, RemoteError> {
        self.portfolios
            .iter_mut()
            .find(|p| p.backend_id == id)
            .ok_or(RemoteError::NotFound)
    }
}

#[async_trait]
impl PortfolioApi for FakePortfolioApi {
    async fn fetch_user_portfolios(&self, user_id: UserId) -> Result<Vec<RemotePortfolio>, RemoteError> {
        self.call(ApiCall::FetchUserPortfolios(user_id), |s| Ok(s.portfolios.clone()))
    }

    async fn create_portfolio(&self, user_id: UserId, name: &str) -> Result<RemotePortfolio, RemoteError> {
        let call = ApiCall::CreatePortfolio {
            user_id,
            name: name.to_string(),
        };
        self.call(call, |s| {
            let id = BackendId::new(s.allocate()).ok_or(RemoteError::InvalidResponse("id".into()))?;
            let created = RemotePortfolio::new(id, Some(name.to_string()));
            s.portfolios.push(created.clone());
            Ok(created)
        })
    }

    async fn update_portfolio(&self, id: BackendId, name: &str) -> Result<(), RemoteError> {
        let call = ApiCall::UpdatePortfolio {
            id,
            name: name.to_string(),
        };
        self.call(call, |s| {
            s.portfolio_mut(id)?.name = name.to_string();
            Ok(())
        })
    }

    async fn delete_portfolio(&self, id: BackendId) -> Result<(), RemoteError> {
        self.call(ApiCall::DeletePortfolio(id), |s| {
            s.portfolio_mut(id)?;
            s.portfolios.retain(|p| p.backend_id != id);
            Ok(())
        })
    }

    async fn create_experience(&self, portfolio_id: BackendId, draft: &ExperienceDraft) -> Result<Experience, RemoteError> {
        self.call(ApiCall::CreateExperience(portfolio_id), |s| {
            let id = EntryId::from(s.allocate());
            let created = Experience::from_draft(id, draft.clone());
            s.portfolio_mut(portfolio_id)?.experiences.push(created.clone());
            Ok(created)
        })
    }

    async fn update_experience(&self, id: EntryId, draft: &ExperienceDraft) -> Result<Experience, RemoteError> {
        self.call(ApiCall::UpdateExperience(id), |s| {
            let slot = s
                .portfolios
                .iter_mut()
                .flat_map(|p| p.experiences.iter_mut())
                .find(|e| e.id == id)
                .ok_or(RemoteError::NotFound)?;
            *slot = Experience::from_draft(id, draft.clone());
            Ok(slot.clone())
        })
    }

    async fn delete_experience(&self, id: EntryId) -> Result<(), RemoteError> {
        self.call(ApiCall::DeleteExperience(id), |s| {
            for p in &mut s.portfolios {
                p.experiences.retain(|e| e.id != id);
            }
            Ok(())
        })
    }

    async fn create_education(&self, portfolio_id: BackendId, draft: &EducationDraft) -> Result<Education, RemoteError> {
        self.call(ApiCall::CreateEducation(portfolio_id), |s| {
            let id = EntryId::from(s.allocate());
            let created = Education::from_draft(id, draft.clone());
            s.portfolio_mut(portfolio_id)?.educations.push(created.clone());
            Ok(created)
        })
    }

    async fn update_education(&self, id: EntryId, draft: &EducationDraft) -> Result<Education, RemoteError> {
        self.call(ApiCall::UpdateEducation(id), |s| {
            let slot = s
                .portfolios
                .iter_mut()
                .flat_map(|p| p.educations.iter_mut())
                .find(|e| e.id == id)
                .ok_or(RemoteError::NotFound)?;
            *slot = Education::from_draft(id, draft.clone());
            Ok(slot.clone())
        })
    }

    async fn delete_education(&self, id: EntryId) -> Result<(), RemoteError> {
        self.call(ApiCall::DeleteEducation(id), |s| {
            for p in &mut s.portfolios {
                p.educations.retain(|e| e.id != id);
            }
            Ok(())
        })
    }
}

/// Store whose reads of one key fail with an I/O error. Writes go through to
/// the wrapped [`MemoryStore`].
pub struct UnreadableKeyStore {
    pub inner: Arc<MemoryStore>,
    pub key: &'static str,
}

impl KeyValueStore for UnreadableKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if key == self.key {
            return Err(StoreError::Io {
                key: key.to_string(),
                message: "stream did not contain valid UTF-8".to_string(),
            });
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}
