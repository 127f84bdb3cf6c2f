use serde_json::Value;
use tracing::{info, warn};

use crate::modules::portfolio::application::cache::state_cache::{
    decode_entries, CacheError, StateCache, PORTFOLIOS_KEY,
};
use crate::modules::portfolio::domain::entities::{Portfolio, PortfolioId, DEFAULT_PORTFOLIO_NAME};
use crate::shared::clock::LocalIdClock;

pub const LEGACY_EXPERIENCES_KEY: &str = "experiences";
pub const LEGACY_EDUCATIONS_KEY: &str = "educations";
pub const LEGACY_SKILLS_KEY: &str = "skills";
pub const LEGACY_LANGUAGES_KEY: &str = "languages";

pub const LEGACY_KEYS: [&str; 4] = [
    LEGACY_EXPERIENCES_KEY,
    LEGACY_EDUCATIONS_KEY,
    LEGACY_SKILLS_KEY,
    LEGACY_LANGUAGES_KEY,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    NotNeeded,
    Migrated {
        portfolio_id: PortfolioId,
        entries: usize,
    },
}

fn read_legacy_array(cache: &StateCache, key: &str) -> Result<Vec<Value>, CacheError> {
    let Some(raw) = cache.store().get(key)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<Value>>(&raw) {
        Ok(values) => Ok(values),
        Err(e) => {
            warn!("Legacy key '{}' is not a list, ignoring it: {}", key, e);
            Ok(Vec::new())
        }
    }
}

/// Folds the pre-portfolio layout (four top-level lists) into a single
/// default portfolio.
///
/// Runs only when no `portfolios` key exists and at least one legacy key
/// does. The new layout is written before the legacy keys are removed, so an
/// interrupted run is simply repeated on the next start.
pub fn migrate_legacy_schema(
    cache: &StateCache,
    ids: &mut LocalIdClock,
) -> Result<MigrationOutcome, CacheError> {
    if cache.store().contains(PORTFOLIOS_KEY)? {
        return Ok(MigrationOutcome::NotNeeded);
    }

    let mut present = false;
    for key in LEGACY_KEYS {
        present |= cache.store().contains(key)?;
    }
    if !present {
        return Ok(MigrationOutcome::NotNeeded);
    }

    let mut portfolio = Portfolio::local(PortfolioId::from(ids.next_id()), DEFAULT_PORTFOLIO_NAME);
    portfolio.experiences =
        decode_entries(read_legacy_array(cache, LEGACY_EXPERIENCES_KEY)?, "legacy experience");
    portfolio.educations =
        decode_entries(read_legacy_array(cache, LEGACY_EDUCATIONS_KEY)?, "legacy education");
    portfolio.skills = decode_entries(read_legacy_array(cache, LEGACY_SKILLS_KEY)?, "legacy skill");
    portfolio.languages =
        decode_entries(read_legacy_array(cache, LEGACY_LANGUAGES_KEY)?, "legacy language");

    cache.save_portfolios(std::slice::from_ref(&portfolio))?;
    cache.save_active_id(portfolio.id)?;

    for key in LEGACY_KEYS {
        cache.store().remove(key)?;
    }

    info!(
        "Migrated {} legacy entries into portfolio {}",
        portfolio.entry_count(),
        portfolio.id
    );

    Ok(MigrationOutcome::Migrated {
        portfolio_id: portfolio.id,
        entries: portfolio.entry_count(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::modules::portfolio::application::cache::state_cache::ACTIVE_PORTFOLIO_KEY;
    use crate::shared::storage::{KeyValueStore, MemoryStore};
    use serde_json::json;

    fn setup(entries: Vec<(&str, String)>) -> (Arc<MemoryStore>, StateCache) {
        let store = Arc::new(MemoryStore::with_entries(entries));
        let cache = StateCache::new(store.clone());
        (store, cache)
    }

    #[test]
    fn folds_legacy_lists_into_one_portfolio() {
        let (store, cache) = setup(vec![
            (
                LEGACY_SKILLS_KEY,
                json!([{ "id": 1, "title": "Rust" }]).to_string(),
            ),
            (
                LEGACY_LANGUAGES_KEY,
                json!([{ "id": 2, "title": "English", "level": "Fluent" }]).to_string(),
            ),
        ]);
        let mut clock = LocalIdClock::new();

        let outcome = migrate_legacy_schema(&cache, &mut clock).unwrap();

        let MigrationOutcome::Migrated { portfolio_id, entries } = outcome else {
            panic!("expected a migration, got {outcome:?}");
        };
        assert_eq!(entries, 2);
        assert_eq!(
            store.keys().unwrap(),
            vec![ACTIVE_PORTFOLIO_KEY.to_string(), PORTFOLIOS_KEY.to_string()]
        );

        let portfolios = cache.load_portfolios(&mut clock).unwrap().unwrap();
        assert_eq!(portfolios.len(), 1);
        assert_eq!(portfolios[0].id, portfolio_id);
        assert_eq!(portfolios[0].name, DEFAULT_PORTFOLIO_NAME);
        assert_eq!(portfolios[0].skills[0].title, "Rust");
        assert_eq!(cache.load_active_id().unwrap(), Some(portfolio_id));
    }

    #[test]
    fn is_a_no_op_once_portfolios_exist() {
        let (store, cache) = setup(vec![
            (PORTFOLIOS_KEY, "[]".to_string()),
            (LEGACY_SKILLS_KEY, "[]".to_string()),
        ]);

        let outcome = migrate_legacy_schema(&cache, &mut LocalIdClock::new()).unwrap();

        assert_eq!(outcome, MigrationOutcome::NotNeeded);
        assert!(store.contains(LEGACY_SKILLS_KEY).unwrap());
    }

    #[test]
    fn fresh_install_needs_nothing() {
        let (store, cache) = setup(vec![]);

        let outcome = migrate_legacy_schema(&cache, &mut LocalIdClock::new()).unwrap();

        assert_eq!(outcome, MigrationOutcome::NotNeeded);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn garbage_legacy_key_is_still_cleared() {
        let (store, cache) = setup(vec![(LEGACY_EXPERIENCES_KEY, "not json".to_string())]);

        let outcome = migrate_legacy_schema(&cache, &mut LocalIdClock::new()).unwrap();

        assert!(matches!(outcome, MigrationOutcome::Migrated { entries: 0, .. }));
        assert!(!store.contains(LEGACY_EXPERIENCES_KEY).unwrap());
    }
}
