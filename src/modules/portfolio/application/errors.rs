use crate::modules::portfolio::domain::entities::{EntryId, PortfolioId};
use crate::modules::portfolio::domain::policies::EntityKind;
use crate::shared::api::RemoteError;

/// Errors surfaced by synchronizer operations. Messages are written for the
/// end user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No valid portfolio selected. Select or create a portfolio first")]
    NoValidPortfolioIdentifier,

    #[error("Portfolio {portfolio_id} only exists on this device. Create it online before adding a {kind}")]
    LocalOnlyPortfolioNotSynced {
        portfolio_id: PortfolioId,
        kind: EntityKind,
    },

    #[error("Access denied. Please log in again")]
    AccessDenied,

    #[error("The requested item no longer exists on the server")]
    NotFound,

    #[error("Server unreachable: {0}")]
    Unreachable(String),

    #[error("The last remaining portfolio cannot be deleted")]
    LastPortfolio,

    #[error("Unknown portfolio {0}")]
    UnknownPortfolio(PortfolioId),

    #[error("Unknown {kind} {id}")]
    UnknownEntity { kind: EntityKind, id: EntryId },

    #[error("Portfolio {portfolio_id} was saved on this device only: {cause}")]
    StoredLocallyOnly {
        portfolio_id: PortfolioId,
        cause: Box<SyncError>,
    },
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unauthorized | RemoteError::Forbidden => SyncError::AccessDenied,
            RemoteError::NotFound => SyncError::NotFound,
            RemoteError::Rejected { status, message } if message.trim().is_empty() => {
                SyncError::Unreachable(format!("server answered with status {status}"))
            }
            RemoteError::Rejected { message, .. } => SyncError::Unreachable(message),
            RemoteError::Unreachable(msg) | RemoteError::InvalidResponse(msg) => {
                SyncError::Unreachable(msg)
            }
        }
    }
}
