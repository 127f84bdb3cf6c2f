use std::collections::HashSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::modules::portfolio::domain::entities::{
    BackendId, Education, Experience, Language, Portfolio, PortfolioId, PortfolioLink, Profile,
    Skill,
};
use crate::shared::clock::{LocalIdClock, MAX_ID};
use crate::shared::storage::{KeyValueStore, StoreError};

pub const PROFILE_KEY: &str = "profile";
pub const PORTFOLIOS_KEY: &str = "portfolios";
pub const ACTIVE_PORTFOLIO_KEY: &str = "activePortfolioId";

#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid cache data under '{key}': {reason}")]
    InvalidCacheData { key: &'static str, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// On-disk shape of a portfolio. Child collections are kept as raw values so
/// one malformed entry does not take its siblings down with it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPortfolio {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default, alias = "idPort")]
    backend_id: Option<i64>,
    name: String,
    #[serde(default)]
    experiences: Vec<Value>,
    #[serde(default)]
    educations: Vec<Value>,
    #[serde(default)]
    skills: Vec<Value>,
    #[serde(default)]
    languages: Vec<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredPortfolioRef<'a> {
    id: PortfolioId,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend_id: Option<BackendId>,
    name: &'a str,
    experiences: &'a [Experience],
    educations: &'a [Education],
    skills: &'a [Skill],
    languages: &'a [Language],
}

impl<'a> From<&'a Portfolio> for StoredPortfolioRef<'a> {
    fn from(p: &'a Portfolio) -> Self {
        Self {
            id: p.id,
            backend_id: p.backend_id(),
            name: &p.name,
            experiences: &p.experiences,
            educations: &p.educations,
            skills: &p.skills,
            languages: &p.languages,
        }
    }
}

/// Decodes each element on its own, dropping (and logging) the ones that do
/// not fit `T`.
pub(crate) fn decode_entries<T: DeserializeOwned>(values: Vec<Value>, what: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Dropping malformed cached {} #{}: {}", what, index, e);
                None
            }
        })
        .collect()
}

/// Where [`StateCache::set_aside`] keeps an undecodable slice.
pub fn unreadable_key(key: &str) -> String {
    format!("{key}-unreadable")
}

fn in_range(id: i64) -> bool {
    (1..=MAX_ID).contains(&id)
}

fn invalid(key: &'static str, reason: impl ToString) -> CacheError {
    CacheError::InvalidCacheData {
        key,
        reason: reason.to_string(),
    }
}

/// Typed access to the synchronizer's slices of the key-value store.
#[derive(Clone)]
pub struct StateCache {
    store: Arc<dyn KeyValueStore>,
}

impl StateCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Copies the raw document under `key` to [`unreadable_key`] so the
    /// defaults written in its place do not lose it.
    pub fn set_aside(&self, key: &str) -> Result<(), CacheError> {
        if let Some(raw) = self.store.get(key)? {
            self.store.set(&unreadable_key(key), &raw)?;
        }
        Ok(())
    }

    pub fn load_profile(&self) -> Result<Option<Profile>, CacheError> {
        let Some(raw) = self.store.get(PROFILE_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| invalid(PROFILE_KEY, e))
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<(), CacheError> {
        let json = serde_json::to_string(profile).map_err(|e| invalid(PROFILE_KEY, e))?;
        self.store.set(PROFILE_KEY, &json)?;
        Ok(())
    }

    /// Loads the cached portfolios, repairing missing identifiers.
    ///
    /// An entry without a usable `id` (missing, duplicated or outside
    /// `1..=MAX_ID`) takes its backend identifier when it has one, a fresh
    /// clock value otherwise. `ids` is advanced past every identifier kept.
    pub fn load_portfolios(&self, ids: &mut LocalIdClock) -> Result<Option<Vec<Portfolio>>, CacheError> {
        let Some(raw) = self.store.get(PORTFOLIOS_KEY)? else {
            return Ok(None);
        };

        let values: Vec<Value> =
            serde_json::from_str(&raw).map_err(|e| invalid(PORTFOLIOS_KEY, e))?;
        let mut stored: Vec<StoredPortfolio> = decode_entries(values, "portfolio");

        for entry in &mut stored {
            if let Some(id) = entry.id.filter(|id| !in_range(*id)) {
                warn!("Ignoring out-of-range cached id {} on '{}'", id, entry.name);
                entry.id = None;
            }
        }
        for entry in &stored {
            for id in entry.id.into_iter().chain(entry.backend_id) {
                ids.observe(id);
            }
        }

        let mut taken = HashSet::new();
        let portfolios = stored
            .into_iter()
            .map(|entry| {
                let link = match entry.backend_id {
                    None => PortfolioLink::Local,
                    Some(raw) => match BackendId::new(raw).filter(|_| in_range(raw)) {
                        Some(backend_id) => PortfolioLink::Synced { backend_id },
                        None => {
                            warn!("Ignoring invalid cached backend id {} on '{}'", raw, entry.name);
                            PortfolioLink::Local
                        }
                    },
                };

                let backend_fallback = match link {
                    PortfolioLink::Synced { backend_id } => Some(backend_id.value()),
                    PortfolioLink::Local => None,
                };
                let id = entry
                    .id
                    .filter(|id| !taken.contains(id))
                    .or(backend_fallback.filter(|id| !taken.contains(id)))
                    .unwrap_or_else(|| ids.next_id());
                taken.insert(id);

                let experiences = decode_entries(entry.experiences, "experience");
                let educations = decode_entries(entry.educations, "education");
                let skills = decode_entries(entry.skills, "skill");
                let languages = decode_entries(entry.languages, "language");

                Portfolio {
                    id: PortfolioId::from(id),
                    link,
                    name: entry.name,
                    experiences,
                    educations,
                    skills,
                    languages,
                }
            })
            .collect();

        Ok(Some(portfolios))
    }

    pub fn save_portfolios(&self, portfolios: &[Portfolio]) -> Result<(), CacheError> {
        let stored: Vec<StoredPortfolioRef<'_>> = portfolios.iter().map(Into::into).collect();
        let json = serde_json::to_string(&stored).map_err(|e| invalid(PORTFOLIOS_KEY, e))?;
        self.store.set(PORTFOLIOS_KEY, &json)?;
        Ok(())
    }

    /// Accepts both a JSON number and a quoted number.
    pub fn load_active_id(&self) -> Result<Option<PortfolioId>, CacheError> {
        let Some(raw) = self.store.get(ACTIVE_PORTFOLIO_KEY)? else {
            return Ok(None);
        };

        let value: Value =
            serde_json::from_str(&raw).map_err(|e| invalid(ACTIVE_PORTFOLIO_KEY, e))?;
        let id = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            Value::Null => return Ok(None),
            _ => None,
        };

        id.map(|id| Some(PortfolioId::from(id)))
            .ok_or_else(|| invalid(ACTIVE_PORTFOLIO_KEY, format!("not an identifier: {value}")))
    }

    pub fn save_active_id(&self, id: PortfolioId) -> Result<(), CacheError> {
        self.store.set(ACTIVE_PORTFOLIO_KEY, &id.value().to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::portfolio::domain::entities::{EntryId, ProficiencyLevel};
    use crate::shared::storage::MemoryStore;
    use serde_json::json;

    fn cache_with(entries: Vec<(&str, String)>) -> StateCache {
        StateCache::new(Arc::new(MemoryStore::with_entries(entries)))
    }

    #[test]
    fn missing_keys_load_as_none() {
        let cache = cache_with(vec![]);
        let mut clock = LocalIdClock::new();

        assert!(cache.load_profile().unwrap().is_none());
        assert!(cache.load_portfolios(&mut clock).unwrap().is_none());
        assert!(cache.load_active_id().unwrap().is_none());
    }

    #[test]
    fn partial_profile_is_rejected_not_patched() {
        let cache = cache_with(vec![(PROFILE_KEY, json!({ "fullName": "Ada" }).to_string())]);

        assert!(matches!(
            cache.load_profile(),
            Err(CacheError::InvalidCacheData { key: PROFILE_KEY, .. })
        ));
    }

    #[test]
    fn portfolios_are_written_and_read_back() {
        let cache = cache_with(vec![]);
        let mut portfolio = Portfolio::synced(BackendId::new(501).unwrap(), "Work");
        portfolio.languages.push(Language {
            id: EntryId::from(9),
            title: "French".into(),
            level: ProficiencyLevel::Native,
            description: String::new(),
        });

        cache.save_portfolios(std::slice::from_ref(&portfolio)).unwrap();
        let loaded = cache.load_portfolios(&mut LocalIdClock::new()).unwrap().unwrap();

        assert_eq!(loaded, vec![portfolio]);
    }

    #[test]
    fn entries_without_id_are_repaired() {
        let cache = cache_with(vec![(
            PORTFOLIOS_KEY,
            json!([
                { "idPort": 42, "name": "From backend" },
                { "name": "Scratch" }
            ])
            .to_string(),
        )]);

        let loaded = cache.load_portfolios(&mut LocalIdClock::new()).unwrap().unwrap();

        assert_eq!(loaded[0].id, PortfolioId::from(42));
        assert!(loaded[0].is_synced());
        assert!(loaded[1].id.value() > 42);
        assert!(!loaded[1].is_synced());
    }

    #[test]
    fn malformed_entries_are_dropped_individually() {
        let cache = cache_with(vec![(
            PORTFOLIOS_KEY,
            json!([
                { "id": 1, "name": "Good", "skills": [
                    { "id": 1, "title": "Rust" },
                    { "title": 17 }
                ]},
                { "id": 2 }
            ])
            .to_string(),
        )]);

        let loaded = cache.load_portfolios(&mut LocalIdClock::new()).unwrap().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].skills.len(), 1);
    }

    #[test]
    fn out_of_range_ids_are_replaced_without_overflow() {
        let cache = cache_with(vec![(
            PORTFOLIOS_KEY,
            json!([
                { "id": i64::MAX, "name": "Huge" },
                { "name": "No id" },
                { "id": 3, "backendId": i64::MAX, "name": "Huge link" }
            ])
            .to_string(),
        )]);

        let loaded = cache.load_portfolios(&mut LocalIdClock::new()).unwrap().unwrap();

        assert_eq!(loaded.len(), 3);
        assert!(loaded.iter().all(|p| p.id.value() > 0 && p.id.value() <= MAX_ID));
        assert_ne!(loaded[0].id, loaded[1].id);
        assert_eq!(loaded[2].id, PortfolioId::from(3));
        assert!(!loaded[2].is_synced());
    }

    #[test]
    fn set_aside_keeps_a_copy_of_the_raw_slice() {
        let cache = cache_with(vec![(PORTFOLIOS_KEY, "{\"oops\":true}".into())]);

        cache.set_aside(PORTFOLIOS_KEY).unwrap();

        assert_eq!(
            cache.store().get(&unreadable_key(PORTFOLIOS_KEY)).unwrap().as_deref(),
            Some("{\"oops\":true}")
        );
        cache.set_aside(PROFILE_KEY).unwrap();
        assert!(!cache.store().contains(&unreadable_key(PROFILE_KEY)).unwrap());
    }

    #[test]
    fn non_array_portfolios_slice_is_invalid() {
        let cache = cache_with(vec![(PORTFOLIOS_KEY, "{\"oops\":true}".into())]);

        assert!(matches!(
            cache.load_portfolios(&mut LocalIdClock::new()),
            Err(CacheError::InvalidCacheData { key: PORTFOLIOS_KEY, .. })
        ));
    }

    #[test]
    fn active_id_accepts_quoted_numbers() {
        let cache = cache_with(vec![(ACTIVE_PORTFOLIO_KEY, "\"17\"".into())]);

        assert_eq!(cache.load_active_id().unwrap(), Some(PortfolioId::from(17)));
    }
}
