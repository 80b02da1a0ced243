//! Credential lifecycle: login, API-key save/delete, logout.
//!
//! Saving an API key produces two ciphertexts of the same plaintext: one
//! here under the install key, one on the server under the server key. They
//! are independent and both must go away on delete. When only one side of a
//! delete succeeds the caller is told which, so it can reconcile a local
//! cache that points at a key the server no longer has (or the reverse).

use crate::backend::KeyBackend;
use crate::error::{ExtensionError, ExtensionResult};
use crate::session::SessionCache;
use crate::storage::LocalStore;
use clary_crypto::Zeroizing;
use std::sync::Arc;
use tracing::{info, warn};

pub struct CredentialLifecycle<S, B> {
    session: SessionCache<S>,
    backend: B,
}

impl<S: LocalStore, B: KeyBackend> CredentialLifecycle<S, B> {
    pub fn new(store: Arc<S>, backend: B) -> Self {
        Self {
            session: SessionCache::new(store),
            backend,
        }
    }

    pub fn session(&self) -> &SessionCache<S> {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Startup: makes sure the install key exists and reports whether a
    /// cached session could be restored.
    pub async fn init(&self) -> ExtensionResult<bool> {
        self.session.install_key().await?;
        let restored = self.session.stored_token().await?.is_some();
        if restored {
            info!("session restored from stored token");
        }
        Ok(restored)
    }

    /// Caches the token issued by a successful login.
    pub async fn start_session(&self, token: &str) -> ExtensionResult<()> {
        self.session.store_token(token).await
    }

    pub async fn is_authenticated(&self) -> ExtensionResult<bool> {
        Ok(self.session.stored_token().await?.is_some())
    }

    /// Caches the key locally, then sends it to the server.
    pub async fn save_api_key(&self, api_key: &str) -> ExtensionResult<()> {
        let token = self.token().await?;
        self.session.cache_api_key(api_key).await?;
        let result = self.backend.save_api_key(&token, api_key).await;
        self.expire_on_401(result).await
    }

    pub async fn api_key_status(&self) -> ExtensionResult<bool> {
        let token = self.token().await?;
        let result = self.backend.api_key_status(&token).await;
        self.expire_on_401(result).await
    }

    /// Removes the key locally and on the server. Both sides are always
    /// attempted.
    pub async fn delete_api_key(&self) -> ExtensionResult<()> {
        let local = self.session.remove_cached_api_key().await;

        let remote = match self.token().await {
            Ok(token) => {
                let result = self.backend.delete_api_key(&token).await;
                self.expire_on_401(result).await
            }
            Err(e) => Err(e),
        };

        match (local, remote) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(remote)) => {
                warn!(error = %remote, "API key removed locally but server delete failed");
                Err(ExtensionError::RemoteDeleteFailed(Box::new(remote)))
            }
            (Err(local), Ok(())) => {
                warn!(error = %local, "API key removed on server but local removal failed");
                Err(ExtensionError::LocalDeleteFailed(Box::new(local)))
            }
            (Err(local), Err(remote)) => Err(ExtensionError::DeleteFailed {
                local: Box::new(local),
                remote: Box::new(remote),
            }),
        }
    }

    /// Tells the server (best effort) and always clears local auth data.
    pub async fn logout(&self) -> ExtensionResult<()> {
        match self.session.stored_token().await {
            Ok(Some(token)) => {
                if let Err(e) = self.backend.logout(&token).await {
                    warn!(error = %e, "backend logout failed, clearing local data anyway");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read cached token during logout"),
        }

        self.session.clear_auth_data().await?;
        info!("logged out");
        Ok(())
    }

    async fn token(&self) -> ExtensionResult<Zeroizing<String>> {
        self.session
            .stored_token()
            .await?
            .ok_or(ExtensionError::NotAuthenticated)
    }

    /// A dead token ends the session locally too.
    async fn expire_on_401<T>(&self, result: ExtensionResult<T>) -> ExtensionResult<T> {
        if let Err(ExtensionError::SessionExpired) = &result {
            warn!("access token rejected (401), forcing logout");
            if let Err(e) = self.session.clear_auth_data().await {
                warn!(error = %e, "failed to clear auth data after 401");
            }
        }
        result
    }
}
