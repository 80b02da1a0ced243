//! Extension-side error types.

use clary_crypto::CryptoError;
use thiserror::Error;

/// Result type for extension credential operations.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

/// Errors that can occur while caching or syncing credentials.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The persisted install secret exists but cannot be imported. Everything
    /// encrypted under it is unrecoverable; it is never overwritten silently.
    #[error("installation secret is corrupt: {0}")]
    CorruptInstallSecret(String),

    #[error("local storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not authenticated, please log in")]
    NotAuthenticated,

    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("API key removed locally but not on the server: {0}")]
    RemoteDeleteFailed(Box<ExtensionError>),

    #[error("API key removed on the server but the local copy remains: {0}")]
    LocalDeleteFailed(Box<ExtensionError>),

    #[error("API key delete failed locally ({local}) and on the server ({remote})")]
    DeleteFailed {
        local: Box<ExtensionError>,
        remote: Box<ExtensionError>,
    },
}

impl ExtensionError {
    /// One side of an API-key delete succeeded and the other did not.
    pub fn is_partial_delete(&self) -> bool {
        matches!(self, Self::RemoteDeleteFailed(_) | Self::LocalDeleteFailed(_))
    }

    /// The user has to log in again to continue.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::SessionExpired)
    }
}
