//! Encrypted cache of the bearer token and API key in local storage.
//!
//! Both values are stored as client envelopes under the install key. A cached
//! value that no longer decrypts (corrupt entry, or the install secret was
//! lost and regenerated) is removed and reported as absent, so the user is
//! asked to log in or re-enter the key instead of hitting the same error on
//! every start.

use crate::error::ExtensionResult;
use crate::install_secret::InstallSecretManager;
use crate::storage::{AUTH_KEYS, ENCRYPTED_API_KEY, LocalStore, TOKEN_KEY, USER_PROFILE_KEY};
use clary_crypto::{ClientEnvelope, InstallKey, Zeroizing, decrypt_string, encrypt_string};
use std::sync::Arc;
use tracing::{debug, warn};

/// Token and API-key cache for one installation.
pub struct SessionCache<S> {
    store: Arc<S>,
    secrets: InstallSecretManager<S>,
}

impl<S: LocalStore> SessionCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            secrets: InstallSecretManager::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The install key (created on first use).
    pub async fn install_key(&self) -> ExtensionResult<InstallKey> {
        self.secrets.get_or_create().await
    }

    // ── Token ──

    pub async fn store_token(&self, token: &str) -> ExtensionResult<()> {
        self.put_encrypted(TOKEN_KEY, token).await
    }

    /// The cached token, or `None` if absent or unreadable.
    pub async fn stored_token(&self) -> ExtensionResult<Option<Zeroizing<String>>> {
        self.get_encrypted(TOKEN_KEY).await
    }

    // ── API key ──

    pub async fn cache_api_key(&self, api_key: &str) -> ExtensionResult<()> {
        self.put_encrypted(ENCRYPTED_API_KEY, api_key).await
    }

    /// The cached API key, or `None` if absent or unreadable.
    pub async fn cached_api_key(&self) -> ExtensionResult<Option<Zeroizing<String>>> {
        self.get_encrypted(ENCRYPTED_API_KEY).await
    }

    pub async fn remove_cached_api_key(&self) -> ExtensionResult<()> {
        self.store.remove(&[ENCRYPTED_API_KEY]).await
    }

    // ── Profile ──

    /// Stores non-secret profile data for the UI. Not encrypted.
    pub async fn store_profile(&self, profile: &serde_json::Value) -> ExtensionResult<()> {
        self.store
            .set(USER_PROFILE_KEY, serde_json::to_string(profile)?)
            .await
    }

    pub async fn profile(&self) -> ExtensionResult<Option<serde_json::Value>> {
        match self.store.get(USER_PROFILE_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Removes token, cached API key and profile together. The install
    /// secret stays.
    pub async fn clear_auth_data(&self) -> ExtensionResult<()> {
        self.store.remove(&AUTH_KEYS).await?;
        debug!("cleared cached auth data");
        Ok(())
    }

    async fn put_encrypted(&self, entry: &str, plaintext: &str) -> ExtensionResult<()> {
        let key = self.secrets.get_or_create().await?;
        let envelope = encrypt_string(plaintext, &key)?;
        self.store.set(entry, envelope.into_string()).await
    }

    async fn get_encrypted(&self, entry: &str) -> ExtensionResult<Option<Zeroizing<String>>> {
        let key = self.secrets.get_or_create().await?;
        let Some(raw) = self.store.get(entry).await? else {
            return Ok(None);
        };

        match decrypt_string(&ClientEnvelope::from_stored(raw), &key) {
            Ok(plaintext) => Ok(Some(plaintext)),
            Err(e) => {
                warn!(entry, error = %e, "cached value failed to decrypt, clearing it");
                self.store.remove(&[entry]).await?;
                Ok(None)
            }
        }
    }
}
