//! Error types for instance providers.

use thiserror::Error;

/// Errors returned by instance sources and controllers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid inventory: {0}")]
    InvalidInventory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RequestFailed(_) | Self::Timeout)
    }
}
