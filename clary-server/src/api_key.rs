//! Save, query, delete and use a user's third-party API key.

use crate::error::{ServerError, ServerResult};
use crate::user_store::UserStore;
use clary_crypto::{ServerCodec, Zeroizing};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shortest API key accepted on save.
pub const API_KEY_MIN_LEN: usize = 20;

/// Longest API key accepted on save.
pub const API_KEY_MAX_LEN: usize = 200;

/// Outcome of reading the stored key.
pub enum ApiKeyLookup {
    /// The user has never saved a key, or deleted it.
    NotOnFile,
    /// Decrypted key. May still be garbage if the envelope was tampered with
    /// (the stored envelope is unauthenticated).
    Present(Zeroizing<String>),
}

impl ApiKeyLookup {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl std::fmt::Debug for ApiKeyLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOnFile => f.write_str("NotOnFile"),
            Self::Present(_) => f.write_str("Present([REDACTED])"),
        }
    }
}

/// How an outbound call that used the decrypted key failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The provider refused the key (401/403). The stored value may be
    /// corrupt or revoked.
    Rejected(String),
    /// Anything else: timeouts, 5xx, empty responses.
    Failed(String),
}

/// API-key operations for the HTTP layer.
pub struct ApiKeyService<S> {
    store: S,
    codec: Arc<ServerCodec>,
}

impl<S: UserStore> ApiKeyService<S> {
    pub fn new(store: S, codec: Arc<ServerCodec>) -> Self {
        Self { store, codec }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encrypts and stores `api_key`, replacing any previous one.
    pub async fn save_api_key(&self, user_id: &str, api_key: &str) -> ServerResult<()> {
        let len = api_key.chars().count();
        if !(API_KEY_MIN_LEN..=API_KEY_MAX_LEN).contains(&len) {
            return Err(ServerError::InvalidInput(format!(
                "apiKey must be {API_KEY_MIN_LEN} to {API_KEY_MAX_LEN} characters, got {len}"
            )));
        }

        let envelope = self.codec.encrypt(api_key)?;
        self.store.set_api_key(user_id, envelope).await?;
        info!(user_id, "API key saved");
        Ok(())
    }

    /// Whether a key is on file. Never decrypts.
    pub async fn api_key_status(&self, user_id: &str) -> ServerResult<bool> {
        Ok(self.store.api_key(user_id).await?.is_some())
    }

    /// Removes the stored key.
    pub async fn delete_api_key(&self, user_id: &str) -> ServerResult<()> {
        self.store.unset_api_key(user_id).await?;
        info!(user_id, "API key removed");
        Ok(())
    }

    /// Reads and decrypts the stored key.
    ///
    /// An unreadable envelope is [`ServerError::StoredKeyUnreadable`], which
    /// is distinct from [`ApiKeyLookup::NotOnFile`].
    pub async fn load_api_key(&self, user_id: &str) -> ServerResult<ApiKeyLookup> {
        let Some(envelope) = self.store.api_key(user_id).await? else {
            debug!(user_id, "no API key on file");
            return Ok(ApiKeyLookup::NotOnFile);
        };

        match self.codec.decrypt(&envelope) {
            Ok(plaintext) => Ok(ApiKeyLookup::Present(plaintext)),
            Err(e) => {
                warn!(user_id, error = %e, "stored API key is unreadable");
                Err(ServerError::StoredKeyUnreadable(e))
            }
        }
    }

    /// Decrypts the stored key and hands it to `call`.
    ///
    /// A rejection from the provider becomes [`ServerError::KeyRejected`]:
    /// the envelope has no integrity check, so a bad stored value only shows
    /// up here. Nothing is retried.
    pub async fn with_api_key<T, F, Fut>(&self, user_id: &str, call: F) -> ServerResult<T>
    where
        F: FnOnce(Zeroizing<String>) -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let api_key = match self.load_api_key(user_id).await? {
            ApiKeyLookup::Present(key) => key,
            ApiKeyLookup::NotOnFile => return Err(ServerError::NoKeyOnFile),
        };

        call(api_key).await.map_err(|e| match e {
            UpstreamError::Rejected(msg) => {
                warn!(user_id, "upstream rejected stored API key");
                ServerError::KeyRejected(msg)
            }
            UpstreamError::Failed(msg) => ServerError::Upstream(msg),
        })
    }
}
