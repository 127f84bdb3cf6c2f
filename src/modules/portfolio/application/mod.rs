pub mod background;
pub mod cache;
pub mod entries;
pub mod errors;
pub mod ports;
pub mod synchronizer;

pub use errors::SyncError;
pub use synchronizer::{KeepReason, PortfolioSynchronizer, ReconcileOutcome};
