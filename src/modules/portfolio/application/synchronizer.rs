use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::auth::application::services::session_context::SessionContext;
use crate::modules::portfolio::application::background::BackgroundTasks;
use crate::modules::portfolio::application::cache::state_cache::{PORTFOLIOS_KEY, PROFILE_KEY};
use crate::modules::portfolio::application::cache::{
    migrate_legacy_schema, CacheError, MigrationOutcome, StateCache,
};
use crate::modules::portfolio::application::entries::{
    create_remote, delete_remote, update_remote, PortfolioEntry,
};
use crate::modules::portfolio::application::errors::SyncError;
use crate::modules::portfolio::application::ports::outgoing::{PortfolioApi, RemotePortfolio};
use crate::modules::portfolio::domain::entities::{
    BackendId, Education, EducationDraft, EntryId, Experience, ExperienceDraft, Language,
    LanguageDraft, Portfolio, PortfolioId, PortfolioLink, PortfolioPatch, Profile, ProfilePatch,
    Skill, SkillDraft,
};
use crate::modules::portfolio::domain::policies::{EntityKind, MutationPolicy};
use crate::modules::portfolio::domain::portfolio_set::PortfolioSet;
use crate::shared::api::RemoteError;
use crate::shared::clock::LocalIdClock;
use crate::shared::storage::KeyValueStore;

/// Why reconciliation left the cached portfolios in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepReason {
    SignedOut,
    EmptyRemote,
    Failed(SyncError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Replaced { portfolios: usize },
    KeptLocal(KeepReason),
}

/// Whether startup may write defaults over the slice under `key` after it
/// failed to load. Undecodable documents are copied aside first; a slice the
/// store could not read at all is left alone.
fn may_overwrite(cache: &StateCache, key: &str, err: &CacheError) -> bool {
    match err {
        CacheError::InvalidCacheData { .. } => match cache.set_aside(key) {
            Ok(()) => true,
            Err(e) => {
                error!("Could not set aside unreadable '{}': {}", key, e);
                false
            }
        },
        CacheError::Store(_) => false,
    }
}

fn validate_portfolio_name(name: &str) -> Result<String, SyncError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::Validation("portfolio name is required".to_string()));
    }
    Ok(name.to_string())
}

/// Owns the profile, the portfolio collection and the active selection, and
/// keeps them in step with the cache and the backend.
///
/// Each mutation of the collection funnels through one commit step that
/// restores the collection invariants and writes the result through to the
/// cache before the operation returns.
pub struct PortfolioSynchronizer {
    cache: StateCache,
    api: Arc<dyn PortfolioApi>,
    session: SessionContext,
    clock: LocalIdClock,
    profile: Profile,
    portfolios: PortfolioSet,
    background: BackgroundTasks,
}

impl std::fmt::Debug for PortfolioSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioSynchronizer")
            .field("portfolios", &self.portfolios.len())
            .field("active", &self.portfolios.active_id())
            .field("pending_pushes", &self.background.pending())
            .finish()
    }
}

impl PortfolioSynchronizer {
    /// Cache-only startup: migrate the legacy layout, then load and validate
    /// every slice. Never touches the network.
    pub fn initialize(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn PortfolioApi>,
        session: SessionContext,
    ) -> Self {
        let cache = StateCache::new(store);
        let mut clock = LocalIdClock::new();

        match migrate_legacy_schema(&cache, &mut clock) {
            Ok(MigrationOutcome::Migrated { portfolio_id, entries }) => {
                info!("Legacy cache migrated into portfolio {} ({} entries)", portfolio_id, entries)
            }
            Ok(MigrationOutcome::NotNeeded) => {}
            Err(e) => error!("Legacy cache migration failed: {}", e),
        }

        let mut write_profile = true;
        let profile = match cache.load_profile() {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!("No cached profile, starting from defaults");
                Profile::default()
            }
            Err(e) => {
                warn!("Cached profile unusable, starting from defaults: {}", e);
                write_profile = may_overwrite(&cache, PROFILE_KEY, &e);
                Profile::default()
            }
        };

        let mut write_portfolios = true;
        let cached = match cache.load_portfolios(&mut clock) {
            Ok(portfolios) => portfolios.unwrap_or_default(),
            Err(e) => {
                warn!("Cached portfolios unusable, starting empty: {}", e);
                write_portfolios = may_overwrite(&cache, PORTFOLIOS_KEY, &e);
                Vec::new()
            }
        };

        let active = match cache.load_active_id() {
            Ok(active) => active,
            Err(e) => {
                warn!("Cached active portfolio unusable: {}", e);
                None
            }
        };

        for portfolio in &cached {
            for id in Self::entry_ids(portfolio) {
                clock.observe(id.value());
            }
        }

        let (portfolios, repairs) = PortfolioSet::from_parts(cached, active, &mut clock);
        for repair in &repairs {
            info!("Portfolio state repaired on load: {:?}", repair);
        }

        let synchronizer = Self {
            cache,
            api,
            session,
            clock,
            profile,
            portfolios,
            background: BackgroundTasks::new(),
        };
        if write_profile {
            synchronizer.persist_profile();
        }
        if write_portfolios {
            synchronizer.persist_portfolios();
        }

        info!(
            "Loaded {} portfolio(s), active {}",
            synchronizer.portfolios.len(),
            synchronizer.portfolios.active_id()
        );
        synchronizer
    }

    /// [`initialize`](Self::initialize) followed by one reconciliation pass.
    pub async fn start(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn PortfolioApi>,
        session: SessionContext,
    ) -> (Self, ReconcileOutcome) {
        let mut synchronizer = Self::initialize(store, api, session);
        let outcome = synchronizer.reconcile().await;
        (synchronizer, outcome)
    }

    fn entry_ids(portfolio: &Portfolio) -> impl Iterator<Item = EntryId> + '_ {
        portfolio
            .experiences
            .iter()
            .map(|e| e.id)
            .chain(portfolio.educations.iter().map(|e| e.id))
            .chain(portfolio.skills.iter().map(|s| s.id))
            .chain(portfolio.languages.iter().map(|l| l.id))
    }

    //
    // ─── Persistence ──────────────────────────────────────────
    //

    fn persist_profile(&self) {
        if let Err(e) = self.cache.save_profile(&self.profile) {
            error!("Failed to cache profile: {}", e);
        }
    }

    fn persist_portfolios(&self) {
        if let Err(e) = self.cache.save_portfolios(self.portfolios.portfolios()) {
            error!("Failed to cache portfolios: {}", e);
        }
        if let Err(e) = self.cache.save_active_id(self.portfolios.active_id()) {
            error!("Failed to cache active portfolio: {}", e);
        }
    }

    /// The single entry point for changing the collection or the active
    /// selection.
    fn commit<R>(&mut self, change: impl FnOnce(&mut Vec<Portfolio>, &mut PortfolioId) -> R) -> R {
        let (result, repairs) = self.portfolios.apply(&mut self.clock, change);
        for repair in &repairs {
            info!("Portfolio state repaired: {:?}", repair);
        }
        self.persist_portfolios();
        result
    }

    //
    // ─── Reconciliation ───────────────────────────────────────
    //

    /// Replaces the cached collection with the backend's when signed in and
    /// the backend has at least one portfolio. Anything else keeps the cache.
    pub async fn reconcile(&mut self) -> ReconcileOutcome {
        let Some(user_id) = self.session.user_id() else {
            debug!("Signed out, keeping cached portfolios");
            return ReconcileOutcome::KeptLocal(KeepReason::SignedOut);
        };

        match self.api.fetch_user_portfolios(user_id).await {
            Ok(remote) if remote.is_empty() => {
                info!("Backend has no portfolios for user {}, keeping cached ones", user_id);
                ReconcileOutcome::KeptLocal(KeepReason::EmptyRemote)
            }
            Ok(remote) => {
                let fetched: Vec<Portfolio> =
                    remote.into_iter().map(RemotePortfolio::into_portfolio).collect();
                let count = fetched.len();
                self.commit(|portfolios, _| *portfolios = fetched);
                info!("Replaced cached portfolios with {} from backend", count);
                ReconcileOutcome::Replaced { portfolios: count }
            }
            Err(e) => {
                warn!("Portfolio reconciliation failed, keeping cached ones: {}", e);
                ReconcileOutcome::KeptLocal(KeepReason::Failed(e.into()))
            }
        }
    }

    //
    // ─── Read accessors ───────────────────────────────────────
    //

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn portfolios(&self) -> &[Portfolio] {
        self.portfolios.portfolios()
    }

    pub fn portfolio(&self, id: PortfolioId) -> Option<&Portfolio> {
        self.portfolios.get(id)
    }

    pub fn active_portfolio_id(&self) -> PortfolioId {
        self.portfolios.active_id()
    }

    pub fn active_portfolio(&self) -> &Portfolio {
        self.portfolios.active()
    }

    pub fn experiences(&self) -> &[Experience] {
        &self.portfolios.active().experiences
    }

    pub fn educations(&self) -> &[Education] {
        &self.portfolios.active().educations
    }

    pub fn skills(&self) -> &[Skill] {
        &self.portfolios.active().skills
    }

    pub fn languages(&self) -> &[Language] {
        &self.portfolios.active().languages
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    //
    // ─── Profile ──────────────────────────────────────────────
    //

    pub fn update_profile(&mut self, patch: ProfilePatch) -> &Profile {
        self.profile.apply(patch);
        self.persist_profile();
        &self.profile
    }

    //
    // ─── Portfolios (optimistic) ──────────────────────────────
    //

    pub fn switch_portfolio(&mut self, id: PortfolioId) -> Result<(), SyncError> {
        if !self.portfolios.contains(id) {
            return Err(SyncError::UnknownPortfolio(id));
        }
        self.commit(|_, active| *active = id);
        info!("Switched active portfolio to {}", id);
        Ok(())
    }

    /// Creates the portfolio locally, then on the backend when signed in.
    ///
    /// On backend success the portfolio takes the backend identifier as its
    /// local identifier. On backend failure it stays on this device and the
    /// failure comes back as [`SyncError::StoredLocallyOnly`].
    pub async fn add_portfolio(&mut self, name: &str) -> Result<PortfolioId, SyncError> {
        let name = validate_portfolio_name(name)?;

        let local_id = PortfolioId::from(self.clock.next_id());
        let portfolio = Portfolio::local(local_id, name.clone());
        self.commit(|portfolios, _| portfolios.push(portfolio));

        let Some(user_id) = self.session.user_id() else {
            info!("Portfolio {} created on this device only (signed out)", local_id);
            return Ok(local_id);
        };

        match self.api.create_portfolio(user_id, &name).await {
            Ok(remote) => Ok(self.adopt_backend_identity(local_id, remote.backend_id)),
            Err(e) => {
                warn!("Backend rejected portfolio {}: {}", local_id, e);
                Err(SyncError::StoredLocallyOnly {
                    portfolio_id: local_id,
                    cause: Box::new(e.into()),
                })
            }
        }
    }

    fn adopt_backend_identity(&mut self, local_id: PortfolioId, backend_id: BackendId) -> PortfolioId {
        let adopted = PortfolioId::from(backend_id);
        let collides = self
            .portfolios
            .portfolios()
            .iter()
            .any(|p| p.id == adopted && p.id != local_id);

        let final_id = self.commit(|portfolios, active| {
            let Some(portfolio) = portfolios.iter_mut().find(|p| p.id == local_id) else {
                return local_id;
            };
            portfolio.link = PortfolioLink::Synced { backend_id };
            if collides {
                return local_id;
            }
            portfolio.id = adopted;
            if *active == local_id {
                *active = adopted;
            }
            adopted
        });

        if collides {
            warn!(
                "Backend id {} already used locally, portfolio keeps local id {}",
                backend_id, local_id
            );
        } else {
            info!("Portfolio {} synced as {}", local_id, final_id);
        }
        final_id
    }

    /// Applies the change locally and pushes it in the background.
    pub async fn update_portfolio(&mut self, id: PortfolioId, patch: PortfolioPatch) -> Result<(), SyncError> {
        let name = patch.name.as_deref().map(validate_portfolio_name).transpose()?;
        let Some(existing) = self.portfolios.get(id) else {
            return Err(SyncError::UnknownPortfolio(id));
        };
        let backend_id = existing.backend_id();

        if let Some(name) = name.clone() {
            self.commit(|portfolios, _| {
                if let Some(p) = portfolios.iter_mut().find(|p| p.id == id) {
                    p.name = name;
                }
            });
        }

        if let (Some(backend_id), Some(name)) = (backend_id, name) {
            self.push_in_background(format!("update of portfolio {backend_id}"), move |api| async move {
                api.update_portfolio(backend_id, &name).await
            });
        }
        Ok(())
    }

    /// Removes the portfolio locally and deletes it in the background.
    pub async fn delete_portfolio(&mut self, id: PortfolioId) -> Result<(), SyncError> {
        let Some(existing) = self.portfolios.get(id) else {
            return Err(SyncError::UnknownPortfolio(id));
        };
        if self.portfolios.len() == 1 {
            return Err(SyncError::LastPortfolio);
        }
        let backend_id = existing.backend_id();

        self.commit(|portfolios, _| portfolios.retain(|p| p.id != id));
        info!("Deleted portfolio {}", id);

        if let Some(backend_id) = backend_id {
            self.push_in_background(format!("deletion of portfolio {backend_id}"), move |api| async move {
                api.delete_portfolio(backend_id).await
            });
        }
        Ok(())
    }

    fn push_in_background<F, Fut>(&mut self, label: String, push: F)
    where
        F: FnOnce(Arc<dyn PortfolioApi>) -> Fut,
        Fut: std::future::Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        if !self.session.is_authenticated() {
            debug!("Signed out, skipping background {}", label);
            return;
        }
        let push = push(Arc::clone(&self.api));
        self.background.spawn(label, push);
    }

    /// Waits for every background push started so far.
    pub async fn settle_background_tasks(&mut self) {
        self.background.settle().await;
    }

    pub fn pending_background_tasks(&self) -> usize {
        self.background.pending()
    }

    /// Waits for pending pushes and releases the synchronizer.
    pub async fn shutdown(mut self) {
        self.settle_background_tasks().await;
        debug!("Portfolio synchronizer stopped");
    }

    //
    // ─── Portfolio entries (policy-driven) ────────────────────
    //

    fn unsupported(kind: EntityKind) -> SyncError {
        SyncError::Validation(format!("{kind} entries cannot be stored on the server"))
    }

    fn unexpected_response(kind: EntityKind) -> SyncError {
        SyncError::Unreachable(format!("server answered with a record that is not a {kind}"))
    }

    fn remote_failure(kind: EntityKind, action: &str, err: RemoteError) -> SyncError {
        warn!("Server {} of {} failed: {}", action, kind, err);
        err.into()
    }

    /// Checks everything that can fail before the network is touched.
    /// Returns the backend portfolio for remote-backed kinds.
    fn prepare<E: PortfolioEntry>(
        &self,
        target: PortfolioId,
        existing: Option<EntryId>,
    ) -> Result<Option<BackendId>, SyncError> {
        let portfolio = self
            .portfolios
            .get(target)
            .ok_or(SyncError::NoValidPortfolioIdentifier)?;

        let backend_id = match E::KIND.policy() {
            MutationPolicy::LocalOnly => None,
            MutationPolicy::StrictRemote => Some(portfolio.backend_id().ok_or(
                SyncError::LocalOnlyPortfolioNotSynced {
                    portfolio_id: target,
                    kind: E::KIND,
                },
            )?),
            MutationPolicy::Optimistic => return Err(Self::unsupported(E::KIND)),
        };

        if let Some(id) = existing {
            if !E::entries(portfolio).iter().any(|e| e.id() == id) {
                return Err(SyncError::UnknownEntity { kind: E::KIND, id });
            }
        }

        if backend_id.is_some() && !self.session.is_authenticated() {
            return Err(SyncError::AccessDenied);
        }
        Ok(backend_id)
    }

    pub async fn add_entry<E: PortfolioEntry>(
        &mut self,
        target: PortfolioId,
        draft: E::Draft,
    ) -> Result<E, SyncError> {
        E::validate(&draft).map_err(SyncError::Validation)?;
        let draft = E::normalize(draft);

        let entry = match self.prepare::<E>(target, None)? {
            None => E::from_draft(EntryId::from(self.clock.next_id()), draft),
            Some(backend_id) => {
                let remote = E::remote_draft(&draft).ok_or_else(|| Self::unsupported(E::KIND))?;
                let created = create_remote(self.api.as_ref(), backend_id, remote)
                    .await
                    .map_err(|e| Self::remote_failure(E::KIND, "creation", e))?;
                E::from_remote(created).ok_or_else(|| Self::unexpected_response(E::KIND))?
            }
        };
        self.clock.observe(entry.id().value());

        let stored = entry.clone();
        let placed = self.commit(|portfolios, _| {
            portfolios
                .iter_mut()
                .find(|p| p.id == target)
                .map(|p| E::entries_mut(p).push(stored))
                .is_some()
        });
        if !placed {
            warn!("Portfolio {} vanished before {} {} could be stored", target, E::KIND, entry.id());
        }

        debug!("Added {} {} to portfolio {}", E::KIND, entry.id(), target);
        Ok(entry)
    }

    pub async fn update_entry<E: PortfolioEntry>(
        &mut self,
        target: PortfolioId,
        id: EntryId,
        draft: E::Draft,
    ) -> Result<E, SyncError> {
        E::validate(&draft).map_err(SyncError::Validation)?;
        let draft = E::normalize(draft);

        let updated = match self.prepare::<E>(target, Some(id))? {
            None => E::from_draft(id, draft),
            Some(_) => {
                let remote = E::remote_draft(&draft).ok_or_else(|| Self::unsupported(E::KIND))?;
                let answered = update_remote(self.api.as_ref(), id, remote)
                    .await
                    .map_err(|e| Self::remote_failure(E::KIND, "update", e))?;
                E::from_remote(answered).ok_or_else(|| Self::unexpected_response(E::KIND))?
            }
        };

        let stored = updated.clone();
        self.commit(|portfolios, _| {
            let slot = portfolios
                .iter_mut()
                .find(|p| p.id == target)
                .and_then(|p| E::entries_mut(p).iter_mut().find(|e| e.id() == id));
            if let Some(slot) = slot {
                *slot = stored;
            }
        });

        debug!("Updated {} {} in portfolio {}", E::KIND, id, target);
        Ok(updated)
    }

    pub async fn delete_entry<E: PortfolioEntry>(
        &mut self,
        target: PortfolioId,
        id: EntryId,
    ) -> Result<(), SyncError> {
        if self.prepare::<E>(target, Some(id))?.is_some() {
            delete_remote(self.api.as_ref(), E::KIND, id)
                .await
                .map_err(|e| Self::remote_failure(E::KIND, "deletion", e))?;
        }

        self.commit(|portfolios, _| {
            if let Some(p) = portfolios.iter_mut().find(|p| p.id == target) {
                E::entries_mut(p).retain(|e| e.id() != id);
            }
        });

        debug!("Deleted {} {} from portfolio {}", E::KIND, id, target);
        Ok(())
    }

    //
    // ─── Active-portfolio shorthands ──────────────────────────
    //

    pub async fn add_experience(&mut self, draft: ExperienceDraft) -> Result<Experience, SyncError> {
        self.add_entry::<Experience>(self.active_portfolio_id(), draft).await
    }

    pub async fn update_experience(&mut self, id: EntryId, draft: ExperienceDraft) -> Result<Experience, SyncError> {
        self.update_entry::<Experience>(self.active_portfolio_id(), id, draft).await
    }

    pub async fn delete_experience(&mut self, id: EntryId) -> Result<(), SyncError> {
        self.delete_entry::<Experience>(self.active_portfolio_id(), id).await
    }

    pub async fn add_education(&mut self, draft: EducationDraft) -> Result<Education, SyncError> {
        self.add_entry::<Education>(self.active_portfolio_id(), draft).await
    }

    pub async fn update_education(&mut self, id: EntryId, draft: EducationDraft) -> Result<Education, SyncError> {
        self.update_entry::<Education>(self.active_portfolio_id(), id, draft).await
    }

    pub async fn delete_education(&mut self, id: EntryId) -> Result<(), SyncError> {
        self.delete_entry::<Education>(self.active_portfolio_id(), id).await
    }

    pub async fn add_skill(&mut self, draft: SkillDraft) -> Result<Skill, SyncError> {
        self.add_entry::<Skill>(self.active_portfolio_id(), draft).await
    }

    pub async fn update_skill(&mut self, id: EntryId, draft: SkillDraft) -> Result<Skill, SyncError> {
        self.update_entry::<Skill>(self.active_portfolio_id(), id, draft).await
    }

    pub async fn delete_skill(&mut self, id: EntryId) -> Result<(), SyncError> {
        self.delete_entry::<Skill>(self.active_portfolio_id(), id).await
    }

    pub async fn add_language(&mut self, draft: LanguageDraft) -> Result<Language, SyncError> {
        self.add_entry::<Language>(self.active_portfolio_id(), draft).await
    }

    pub async fn update_language(&mut self, id: EntryId, draft: LanguageDraft) -> Result<Language, SyncError> {
        self.update_entry::<Language>(self.active_portfolio_id(), id, draft).await
    }

    pub async fn delete_language(&mut self, id: EntryId) -> Result<(), SyncError> {
        self.delete_entry::<Language>(self.active_portfolio_id(), id).await
    }
}
