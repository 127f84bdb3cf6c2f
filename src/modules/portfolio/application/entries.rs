use crate::modules::portfolio::application::ports::outgoing::PortfolioApi;
use crate::modules::portfolio::domain::entities::{
    BackendId, Education, EducationDraft, EntryId, Experience, ExperienceDraft, Language,
    LanguageDraft, Portfolio, Skill, SkillDraft,
};
use crate::modules::portfolio::domain::policies::EntityKind;
use crate::shared::api::RemoteError;

/// Draft of a backend-stored entry, borrowed for the duration of a call.
#[derive(Debug, Clone, Copy)]
pub enum RemoteDraft<'a> {
    Experience(&'a ExperienceDraft),
    Education(&'a EducationDraft),
}

/// What the backend hands back for a created or updated entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEntry {
    Experience(Experience),
    Education(Education),
}

/// A record living in one of a portfolio's four collections.
///
/// The synchronizer drives every kind through the same add/update/delete
/// code and picks the remote behaviour from `KIND.policy()`.
pub trait PortfolioEntry: Clone + Send + Sync + Sized + 'static {
    type Draft: Clone + Send + Sync;

    const KIND: EntityKind;

    fn id(&self) -> EntryId;

    fn entries(portfolio: &Portfolio) -> &[Self];

    fn entries_mut(portfolio: &mut Portfolio) -> &mut Vec<Self>;

    fn validate(draft: &Self::Draft) -> Result<(), String>;

    /// Canonical form of a draft before it is stored or sent.
    fn normalize(draft: Self::Draft) -> Self::Draft {
        draft
    }

    fn from_draft(id: EntryId, draft: Self::Draft) -> Self;

    /// `None` for kinds the backend does not store.
    fn remote_draft(draft: &Self::Draft) -> Option<RemoteDraft<'_>>;

    fn from_remote(entry: RemoteEntry) -> Option<Self>;
}

impl PortfolioEntry for Experience {
    type Draft = ExperienceDraft;
    const KIND: EntityKind = EntityKind::Experience;

    fn id(&self) -> EntryId {
        self.id
    }

    fn entries(portfolio: &Portfolio) -> &[Self] {
        &portfolio.experiences
    }

    fn entries_mut(portfolio: &mut Portfolio) -> &mut Vec<Self> {
        &mut portfolio.experiences
    }

    fn validate(draft: &ExperienceDraft) -> Result<(), String> {
        draft.validate()
    }

    fn normalize(draft: ExperienceDraft) -> ExperienceDraft {
        draft.normalized()
    }

    fn from_draft(id: EntryId, draft: ExperienceDraft) -> Self {
        Experience::from_draft(id, draft)
    }

    fn remote_draft(draft: &ExperienceDraft) -> Option<RemoteDraft<'_>> {
        Some(RemoteDraft::Experience(draft))
    }

    fn from_remote(entry: RemoteEntry) -> Option<Self> {
        match entry {
            RemoteEntry::Experience(e) => Some(e),
            RemoteEntry::Education(_) => None,
        }
    }
}

impl PortfolioEntry for Education {
    type Draft = EducationDraft;
    const KIND: EntityKind = EntityKind::Education;

    fn id(&self) -> EntryId {
        self.id
    }

    fn entries(portfolio: &Portfolio) -> &[Self] {
        &portfolio.educations
    }

    fn entries_mut(portfolio: &mut Portfolio) -> &mut Vec<Self> {
        &mut portfolio.educations
    }

    fn validate(draft: &EducationDraft) -> Result<(), String> {
        draft.validate()
    }

    fn normalize(draft: EducationDraft) -> EducationDraft {
        draft.normalized()
    }

    fn from_draft(id: EntryId, draft: EducationDraft) -> Self {
        Education::from_draft(id, draft)
    }

    fn remote_draft(draft: &EducationDraft) -> Option<RemoteDraft<'_>> {
        Some(RemoteDraft::Education(draft))
    }

    fn from_remote(entry: RemoteEntry) -> Option<Self> {
        match entry {
            RemoteEntry::Education(e) => Some(e),
            RemoteEntry::Experience(_) => None,
        }
    }
}

impl PortfolioEntry for Skill {
    type Draft = SkillDraft;
    const KIND: EntityKind = EntityKind::Skill;

    fn id(&self) -> EntryId {
        self.id
    }

    fn entries(portfolio: &Portfolio) -> &[Self] {
        &portfolio.skills
    }

    fn entries_mut(portfolio: &mut Portfolio) -> &mut Vec<Self> {
        &mut portfolio.skills
    }

    fn validate(draft: &SkillDraft) -> Result<(), String> {
        draft.validate()
    }

    fn from_draft(id: EntryId, draft: SkillDraft) -> Self {
        Skill::from_draft(id, draft)
    }

    fn remote_draft(_: &SkillDraft) -> Option<RemoteDraft<'_>> {
        None
    }

    fn from_remote(_: RemoteEntry) -> Option<Self> {
        None
    }
}

impl PortfolioEntry for Language {
    type Draft = LanguageDraft;
    const KIND: EntityKind = EntityKind::Language;

    fn id(&self) -> EntryId {
        self.id
    }

    fn entries(portfolio: &Portfolio) -> &[Self] {
        &portfolio.languages
    }

    fn entries_mut(portfolio: &mut Portfolio) -> &mut Vec<Self> {
        &mut portfolio.languages
    }

    fn validate(draft: &LanguageDraft) -> Result<(), String> {
        draft.validate()
    }

    fn from_draft(id: EntryId, draft: LanguageDraft) -> Self {
        Language::from_draft(id, draft)
    }

    fn remote_draft(_: &LanguageDraft) -> Option<RemoteDraft<'_>> {
        None
    }

    fn from_remote(_: RemoteEntry) -> Option<Self> {
        None
    }
}

pub(crate) async fn create_remote(
    api: &dyn PortfolioApi,
    portfolio_id: BackendId,
    draft: RemoteDraft<'_>,
) -> Result<RemoteEntry, RemoteError> {
    match draft {
        RemoteDraft::Experience(d) => api
            .create_experience(portfolio_id, d)
            .await
            .map(RemoteEntry::Experience),
        RemoteDraft::Education(d) => api
            .create_education(portfolio_id, d)
            .await
            .map(RemoteEntry::Education),
    }
}

pub(crate) async fn update_remote(
    api: &dyn PortfolioApi,
    id: EntryId,
    draft: RemoteDraft<'_>,
) -> Result<RemoteEntry, RemoteError> {
    match draft {
        RemoteDraft::Experience(d) => api
            .update_experience(id, d)
            .await
            .map(RemoteEntry::Experience),
        RemoteDraft::Education(d) => api
            .update_education(id, d)
            .await
            .map(RemoteEntry::Education),
    }
}

/// Kinds without a backend counterpart have nothing to delete remotely.
pub(crate) async fn delete_remote(
    api: &dyn PortfolioApi,
    kind: EntityKind,
    id: EntryId,
) -> Result<(), RemoteError> {
    match kind {
        EntityKind::Experience => api.delete_experience(id).await,
        EntityKind::Education => api.delete_education(id).await,
        _ => Ok(()),
    }
}
