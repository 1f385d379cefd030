//! Error types for the coin watchlist SDK

use thiserror::Error;

/// Errors that can occur when fetching prices or the catalog from a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),
}

/// Errors that can occur when reading or writing the durable watchlist blob
///
/// A missing or malformed blob on *read* is never surfaced as an error:
/// the store recovers by treating it as the empty watchlist. These
/// variants cover failures to *write* committed state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying storage I/O failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// State could not be serialized for persistence
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
