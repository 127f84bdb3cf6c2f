pub mod legacy_migration;
pub mod state_cache;

pub use legacy_migration::{migrate_legacy_schema, MigrationOutcome};
pub use state_cache::{CacheError, StateCache};
