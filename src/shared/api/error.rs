// src/shared/api/error.rs

/// Failure of a call against the backend REST API, classified by what the
/// caller can do about it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// 401. The session has already been torn down when this is returned
    /// from an authenticated request.
    #[error("Session expired or invalid")]
    Unauthorized,

    /// 403.
    #[error("Access denied")]
    Forbidden,

    /// 404.
    #[error("Resource not found")]
    NotFound,

    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Unexpected response from backend: {0}")]
    InvalidResponse(String),
}
