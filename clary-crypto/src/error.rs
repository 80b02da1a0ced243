//! Crypto error types.

use thiserror::Error;

/// Result type for envelope operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by the key types and both codecs.
///
/// `Decryption` covers anything structurally wrong with an envelope
/// (separator, encoding, lengths, padding). `Authentication` is only ever
/// produced by the client codec, whose cipher carries an integrity tag.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("authentication failed (wrong key or tampered data)")]
    Authentication,
}

impl CryptoError {
    /// Whether this failure means the stored value is unusable and the user
    /// has to supply the credential again.
    pub fn requires_reentry(&self) -> bool {
        matches!(self, Self::Decryption(_) | Self::Authentication)
    }
}
