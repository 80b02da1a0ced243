//! Key material for both envelopes.
//!
//! [`ServerKey`] is derived, never generated: the backend recomputes it from
//! the configured secret on every start, so identical secret and salt must
//! always yield identical bytes. [`InstallKey`] is the opposite: random,
//! generated once per extension installation, and persisted by the caller.

use crate::error::{CryptoError, CryptoResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of every symmetric key in this crate (AES-256).
pub const KEY_SIZE: usize = 32;

/// Application-wide salt for the server key derivation.
///
/// Changing it makes every stored API key unreadable.
pub const SERVER_KEY_SALT: &[u8] = b"claryvyb_salt";

/// scrypt cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// log2 of the CPU/memory cost `N`.
    pub log_n: u8,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

impl Default for KdfParams {
    /// N = 16384, r = 8, p = 1. Keys derived elsewhere with the same
    /// secret and these costs are interchangeable with ours.
    fn default() -> Self {
        Self {
            log_n: 14,
            r: 8,
            p: 1,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for tests. Never use for stored data.
    pub fn insecure_fast() -> Self {
        Self { log_n: 4, r: 8, p: 1 }
    }
}

/// Process-wide key for the stored API key envelope.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ServerKey([u8; KEY_SIZE]);

impl ServerKey {
    /// Derives the key from `secret` and `salt` with scrypt.
    ///
    /// Deterministic and deliberately slow.
    pub fn derive(secret: &str, salt: &[u8], params: &KdfParams) -> CryptoResult<Self> {
        let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_SIZE)
            .map_err(|e| CryptoError::KeyDerivation(format!("invalid scrypt params: {e}")))?;

        let mut out = [0u8; KEY_SIZE];
        scrypt::scrypt(secret.as_bytes(), salt, &scrypt_params, &mut out)
            .map_err(|e| CryptoError::KeyDerivation(format!("scrypt failed: {e}")))?;

        let key = Self(out);
        out.zeroize();
        Ok(key)
    }

    /// Wraps raw key bytes (e.g. from an external KMS).
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerKey([REDACTED])")
    }
}

/// Per-installation key for the client envelope.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct InstallKey([u8; KEY_SIZE]);

impl InstallKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        let key = Self(bytes);
        bytes.zeroize();
        key
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Imports a key from raw bytes, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Exports the raw key as standard padded base64, the persisted form.
    pub fn export_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.0))
    }

    /// Imports a key from its persisted base64 form.
    pub fn import_base64(encoded: &str) -> CryptoResult<Self> {
        let raw = Zeroizing::new(STANDARD.decode(encoded.trim()).map_err(|e| {
            CryptoError::Decryption(format!("install secret is not base64: {e}"))
        })?);
        Self::from_slice(&raw)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for InstallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InstallKey([REDACTED])")
    }
}
