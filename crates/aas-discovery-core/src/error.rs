//! Error kinds surfaced by the discovery core.

/// Boxed error raised by a storage backend.
pub type StorageSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors for discovery operations.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Malformed identifier, empty name or value, negative limit, or bad cursor
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No record is registered for the identifier
    #[error("not found: {0}")]
    NotFound(String),
    /// Underlying storage failed; the operation was aborted
    #[error("storage failure: {0}")]
    Storage(#[source] StorageSource),
}

impl DiscoveryError {
    /// Wrap a backend error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: Into<StorageSource>,
    {
        Self::Storage(err.into())
    }

    /// Whether this error rejects the caller's input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Whether this error reports an absent record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
