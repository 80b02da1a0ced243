//! Server-side envelope for the user's stored API key.
//!
//! AES-256-CBC with PKCS#7 padding under the process-wide [`ServerKey`],
//! persisted as `hex(iv):hex(ciphertext)`.
//!
//! CBC is unauthenticated. A tampered envelope whose padding still checks
//! out decrypts to garbage instead of failing, so anything that uses the
//! decrypted key must treat an upstream rejection as "stored key may be
//! corrupt". Switching to an AEAD would change the stored format and make
//! every existing value unreadable; that needs an explicit migration.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, SERVER_KEY_SALT, ServerKey};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// CBC IV size (one AES block).
pub const IV_SIZE: usize = 16;

/// Persisted `"<hex-iv>:<hex-ciphertext>"` string.
///
/// Holding one of these says nothing about whether it decrypts; parsing
/// happens in [`ServerCodec::decrypt`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredSecretEnvelope(String);

impl StoredSecretEnvelope {
    /// Wraps a value read back from storage.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn parts(&self) -> CryptoResult<([u8; IV_SIZE], Vec<u8>)> {
        let (iv_hex, ct_hex) = self
            .0
            .split_once(':')
            .ok_or_else(|| CryptoError::Decryption("envelope has no ':' separator".into()))?;

        let iv_bytes = hex::decode(iv_hex)
            .map_err(|e| CryptoError::Decryption(format!("iv is not hex: {e}")))?;
        let iv: [u8; IV_SIZE] = iv_bytes.as_slice().try_into().map_err(|_| {
            CryptoError::Decryption(format!(
                "iv must be {IV_SIZE} bytes, got {}",
                iv_bytes.len()
            ))
        })?;

        let ciphertext = hex::decode(ct_hex)
            .map_err(|e| CryptoError::Decryption(format!("ciphertext is not hex: {e}")))?;
        if ciphertext.is_empty() {
            return Err(CryptoError::Decryption("ciphertext is empty".into()));
        }

        Ok((iv, ciphertext))
    }
}

impl fmt::Debug for StoredSecretEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoredSecretEnvelope")
            .field(&format_args!("{} chars", self.0.len()))
            .finish()
    }
}

/// Encrypts and decrypts stored API keys under the process-wide key.
///
/// Construct once at startup and share (`Arc<ServerCodec>`); the codec is
/// immutable after construction.
pub struct ServerCodec {
    key: ServerKey,
}

impl ServerCodec {
    pub fn new(key: ServerKey) -> Self {
        Self { key }
    }

    /// Derives the key from `secret` and the fixed application salt.
    pub fn from_secret(secret: &str, params: &KdfParams) -> CryptoResult<Self> {
        let key = ServerKey::derive(secret, SERVER_KEY_SALT, params)?;
        debug!(log_n = params.log_n, "derived server envelope key");
        Ok(Self::new(key))
    }

    /// Encrypts `plaintext` under a fresh random IV.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<StoredSecretEnvelope> {
        let mut iv = [0u8; IV_SIZE];
        rand::rng().fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new_from_slices(self.key.as_bytes(), &iv)
            .map_err(|e| CryptoError::Encryption(format!("cipher init failed: {e}")))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        Ok(StoredSecretEnvelope(format!(
            "{}:{}",
            hex::encode(iv),
            hex::encode(ciphertext)
        )))
    }

    /// Decrypts an envelope produced by [`encrypt`](Self::encrypt).
    ///
    /// Structural problems fail with [`CryptoError::Decryption`]. A wrong key
    /// or a tampered ciphertext is only caught if it breaks the padding;
    /// otherwise the result is garbage text (invalid UTF-8 is replaced with
    /// U+FFFD rather than rejected).
    pub fn decrypt(&self, envelope: &StoredSecretEnvelope) -> CryptoResult<Zeroizing<String>> {
        let (iv, ciphertext) = envelope.parts()?;

        let mut plaintext = Aes256CbcDec::new_from_slices(self.key.as_bytes(), &iv)
            .map_err(|e| CryptoError::Decryption(format!("cipher init failed: {e}")))?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| {
                CryptoError::Decryption("bad padding or truncated ciphertext".into())
            })?;

        let text = Zeroizing::new(String::from_utf8_lossy(&plaintext).into_owned());
        plaintext.zeroize();
        Ok(text)
    }
}

impl fmt::Debug for ServerCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerCodec").finish_non_exhaustive()
    }
}
