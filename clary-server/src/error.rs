//! Backend credential error types.

use clary_crypto::CryptoError;
use thiserror::Error;

/// Result type for backend credential operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors surfaced to the HTTP layer.
///
/// None of these should take the process down; the router maps each to a
/// status via [`ServerError::status_code`].
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no API key on file")]
    NoKeyOnFile,

    #[error("stored API key could not be read, please re-enter your API key")]
    StoredKeyUnreadable(#[source] CryptoError),

    #[error("API key was rejected upstream, please re-enter your API key: {0}")]
    KeyRejected(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl ServerError {
    /// Whether the user has to enter their API key again to recover.
    pub fn requires_key_reentry(&self) -> bool {
        matches!(self, Self::StoredKeyUnreadable(_) | Self::KeyRejected(_))
    }

    /// HTTP status the router should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::NoKeyOnFile => 400,
            Self::UserNotFound(_) => 404,
            Self::StoredKeyUnreadable(_) => 409,
            Self::KeyRejected(_) | Self::Upstream(_) => 502,
            Self::Storage(_) | Self::Config(_) | Self::Crypto(_) => 500,
        }
    }

    /// Whether the message is safe to show to the client verbatim.
    pub fn is_exposed(&self) -> bool {
        self.status_code() < 500 || self.requires_key_reentry()
    }
}
