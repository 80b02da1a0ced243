//! Durable key-value storage local to one installation.
//!
//! Mirrors the browser's extension-local storage: string keys, string
//! values, each entry independently optional.

use crate::error::{ExtensionError, ExtensionResult};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Raw install key, base64.
pub const INSTALL_SECRET_KEY: &str = "clary:installSecret";
/// Bearer token, client envelope.
pub const TOKEN_KEY: &str = "clary:token";
/// Third-party API key, client envelope.
pub const ENCRYPTED_API_KEY: &str = "clary:encryptedApiKey";
/// Non-secret profile JSON shown in the UI.
pub const USER_PROFILE_KEY: &str = "clary:userProfile";

/// Everything removed when authentication state is cleared. The install
/// secret is deliberately absent.
pub const AUTH_KEYS: [&str; 3] = [TOKEN_KEY, ENCRYPTED_API_KEY, USER_PROFILE_KEY];

/// Extension-local key-value storage.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = ExtensionResult<Option<String>>> + Send;

    fn set(&self, key: &str, value: String) -> impl Future<Output = ExtensionResult<()>> + Send;

    /// Stores `value` only if `key` has no value yet, atomically with respect
    /// to every other call on this store. Returns whatever is stored after
    /// the call: `value` if it was written, the existing value otherwise.
    fn set_if_absent(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = ExtensionResult<String>> + Send;

    /// Removes every key in `keys`. Missing keys are ignored.
    fn remove(&self, keys: &[&str]) -> impl Future<Output = ExtensionResult<()>> + Send;
}

/// In-memory store, shared between clones.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl LocalStore for MemoryStore {
    async fn get(&self, key: &str) -> ExtensionResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> ExtensionResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: String) -> ExtensionResult<String> {
        let mut entries = self.entries.write().await;
        Ok(entries.entry(key.to_string()).or_insert(value).clone())
    }

    async fn remove(&self, keys: &[&str]) -> ExtensionResult<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new contents.
///
/// Updates are serialised per instance only. Open exactly one `FileStore`
/// per path and share it (`Arc<FileStore>`); two instances on the same file
/// can lose each other's writes.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> ExtensionResult<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                let path = self.path.display();
                ExtensionError::Storage(format!("{path} is not a JSON object: {e}"))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &HashMap<String, String>) -> ExtensionResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    async fn get(&self, key: &str) -> ExtensionResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> ExtensionResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await
    }

    async fn set_if_absent(&self, key: &str, value: String) -> ExtensionResult<String> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if let Some(existing) = entries.get(key) {
            return Ok(existing.clone());
        }
        entries.insert(key.to_string(), value.clone());
        self.write_all(&entries).await?;
        Ok(value)
    }

    async fn remove(&self, keys: &[&str]) -> ExtensionResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before {
            return Ok(());
        }
        self.write_all(&entries).await
    }
}
