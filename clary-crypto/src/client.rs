//! Client-side envelope for secrets cached in extension local storage.
//!
//! AES-256-GCM under the per-installation [`InstallKey`]. The persisted form
//! is `base64(nonce || ciphertext || tag)` as one string. Unlike the server
//! envelope this one is authenticated: a wrong key or any modified byte is
//! reported as [`CryptoError::Authentication`].

use crate::error::{CryptoError, CryptoResult};
use crate::key::InstallKey;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// AES-GCM nonce size.
pub const NONCE_SIZE: usize = 12;

/// AES-GCM tag size.
pub const TAG_SIZE: usize = 16;

/// Persisted `base64(nonce || ciphertext || tag)` string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientEnvelope(String);

impl ClientEnvelope {
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for ClientEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientEnvelope")
            .field(&format_args!("{} chars", self.0.len()))
            .finish()
    }
}

fn cipher(key: &InstallKey) -> CryptoResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::InvalidKeyLength {
        expected: crate::KEY_SIZE,
        actual: key.as_bytes().len(),
    })
}

/// Encrypts `plaintext` under `key` with a fresh random nonce.
pub fn encrypt_string(plaintext: &str, key: &InstallKey) -> CryptoResult<ClientEnvelope> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce);

    let ciphertext = cipher(key)?
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption(format!("AES-GCM seal failed: {e}")))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce);
    combined.extend_from_slice(&ciphertext);

    Ok(ClientEnvelope(STANDARD.encode(combined)))
}

/// Decrypts an envelope produced by [`encrypt_string`].
pub fn decrypt_string(
    envelope: &ClientEnvelope,
    key: &InstallKey,
) -> CryptoResult<Zeroizing<String>> {
    let combined = STANDARD
        .decode(envelope.as_str())
        .map_err(|e| CryptoError::Decryption(format!("envelope is not base64: {e}")))?;

    if combined.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::Decryption(format!(
            "envelope too short: {} bytes, need at least {}",
            combined.len(),
            NONCE_SIZE + TAG_SIZE
        )));
    }

    let (nonce, ciphertext) = combined.split_at(NONCE_SIZE);
    let plaintext = Zeroizing::new(
        cipher(key)?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Authentication)?,
    );

    let text = std::str::from_utf8(&plaintext)
        .map_err(|_| CryptoError::Decryption("plaintext is not UTF-8".into()))?;
    Ok(Zeroizing::new(text.to_owned()))
}
