//! Credential envelopes for Clary.
//!
//! Two independent envelopes protect the same kind of secret in two places:
//!
//! 1. **Server envelope** ([`server`]): the backend derives one key per
//!    process from its configured secret (scrypt, fixed salt) and stores each
//!    user's third-party API key as `hex(iv):hex(ciphertext)` using
//!    AES-256-CBC. Unauthenticated; see the module docs.
//!
//! 2. **Client envelope** ([`client`]): the extension generates one random
//!    key per installation and caches the bearer token and API key as
//!    `base64(nonce || ciphertext || tag)` using AES-256-GCM.
//!
//! The same plaintext API key therefore exists as two unrelated ciphertexts
//! under two unrelated keys. Neither side can read the other's envelope.

pub mod client;
mod error;
mod key;
pub mod server;

pub use client::{ClientEnvelope, NONCE_SIZE, TAG_SIZE, decrypt_string, encrypt_string};
pub use error::{CryptoError, CryptoResult};
pub use key::{InstallKey, KEY_SIZE, KdfParams, SERVER_KEY_SALT, ServerKey};
pub use server::{IV_SIZE, ServerCodec, StoredSecretEnvelope};
pub use zeroize::Zeroizing;
