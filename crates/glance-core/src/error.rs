// Error types for the ingestion pipeline

use thiserror::Error;

/// Result type alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackError>;

/// Errors that can occur while ingesting a tracking payload
#[derive(Debug, Error)]
pub enum TrackError {
    /// Payload failed validation (missing path, malformed fields)
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Neither websiteId nor domain resolved to a website
    #[error("website could not be resolved")]
    UnresolvedWebsite,

    /// Persistence failure; broadcast must not happen after this
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TrackError {
    /// Create a validation error
    pub fn invalid(msg: impl Into<String>) -> Self {
        TrackError::InvalidPayload(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        TrackError::Storage(msg.into())
    }

    /// True when the caller sent something unacceptable (maps to a 4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TrackError::InvalidPayload(_) | TrackError::UnresolvedWebsite
        )
    }
}
