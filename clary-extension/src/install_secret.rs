//! Lifecycle of the per-installation key.
//!
//! The key is generated once, persisted as base64 under
//! [`INSTALL_SECRET_KEY`], and read back on every start. If two first-use
//! calls could each generate a key, whichever write landed last would win
//! and anything encrypted under the other would be orphaned.
//!
//! Two gates prevent that. Within one manager the [`OnceCell`] makes
//! load-or-generate single-flight: concurrent callers wait for it and share
//! its result. Across managers on the same store the key is persisted with
//! [`LocalStore::set_if_absent`], so the first write wins and every later
//! generator adopts the persisted key instead of its own.

use crate::error::{ExtensionError, ExtensionResult};
use crate::storage::{INSTALL_SECRET_KEY, LocalStore};
use clary_crypto::InstallKey;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Owns the install key for one store.
pub struct InstallSecretManager<S> {
    store: Arc<S>,
    key: OnceCell<InstallKey>,
}

impl<S: LocalStore> InstallSecretManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            key: OnceCell::new(),
        }
    }

    /// Returns the install key, loading or creating it on first use.
    ///
    /// A failed first attempt is not cached; the next call tries again.
    pub async fn get_or_create(&self) -> ExtensionResult<InstallKey> {
        self.key
            .get_or_try_init(|| self.load_or_generate())
            .await
            .cloned()
    }

    /// Whether the key has been loaded into memory yet.
    pub fn is_loaded(&self) -> bool {
        self.key.initialized()
    }

    async fn load_or_generate(&self) -> ExtensionResult<InstallKey> {
        if let Some(encoded) = self.store.get(INSTALL_SECRET_KEY).await? {
            let key = InstallKey::import_base64(&encoded)
                .map_err(|e| ExtensionError::CorruptInstallSecret(e.to_string()))?;
            debug!("loaded installation secret");
            return Ok(key);
        }

        let generated = InstallKey::generate();
        let persisted = self
            .store
            .set_if_absent(INSTALL_SECRET_KEY, generated.export_base64().to_string())
            .await?;
        let key = InstallKey::import_base64(&persisted)
            .map_err(|e| ExtensionError::CorruptInstallSecret(e.to_string()))?;

        if key == generated {
            info!("new installation secret generated and stored");
        } else {
            debug!("installation secret was created concurrently, using the stored one");
        }
        Ok(key)
    }
}
