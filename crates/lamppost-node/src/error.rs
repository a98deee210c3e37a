//! Error types for the Lamppost node.

use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in node operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing request input
    #[error("invalid request: {0}")]
    Validation(String),

    /// The reverse-geocoding upstream is unreachable or returned no usable
    /// locality. Surfaced to the write path; a locality is never invented.
    #[error("no locality could be resolved for this location")]
    GeocodingUnavailable,

    /// The moderation classifier is unreachable or returned something
    /// unusable. Consumed internally by the fallback policy; never becomes
    /// an HTTP failure.
    #[error("moderation classifier unavailable: {0}")]
    ModerationUnavailable(String),

    /// The request may not write into its target locality
    #[error("not authorized to post in this locality")]
    AccessDenied,

    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
