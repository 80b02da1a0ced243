//! User records holding the stored API key envelope.
//!
//! The real backend keeps users in a document database. Everything here only
//! needs the one optional field, so persistence sits behind [`UserStore`].

use crate::error::{ServerError, ServerResult};
use clary_crypto::StoredSecretEnvelope;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A user as far as credential storage is concerned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    /// `None` means "no key on file". Present-but-unreadable is only
    /// discovered on decrypt.
    #[serde(default, rename = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<StoredSecretEnvelope>,
}

/// Persistence for the API key field of user records.
pub trait UserStore: Send + Sync {
    /// Reads the stored envelope. `Ok(None)` if the user has none.
    fn api_key(
        &self,
        user_id: &str,
    ) -> impl Future<Output = ServerResult<Option<StoredSecretEnvelope>>> + Send;

    /// Creates or overwrites the stored envelope.
    fn set_api_key(
        &self,
        user_id: &str,
        envelope: StoredSecretEnvelope,
    ) -> impl Future<Output = ServerResult<()>> + Send;

    /// Removes the field. Removing an absent key is not an error.
    fn unset_api_key(&self, user_id: &str) -> impl Future<Output = ServerResult<()>> + Send;
}

/// In-process user store.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user and returns its generated id.
    pub async fn create_user(&self, email: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let record = UserRecord {
            id: id.clone(),
            email: email.to_string(),
            api_key: None,
        };
        self.users.write().await.insert(id.clone(), record);
        id
    }

    /// Snapshot of a record, for inspection.
    pub async fn get(&self, user_id: &str) -> Option<UserRecord> {
        self.users.read().await.get(user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl UserStore for MemoryUserStore {
    async fn api_key(&self, user_id: &str) -> ServerResult<Option<StoredSecretEnvelope>> {
        self.users
            .read()
            .await
            .get(user_id)
            .map(|u| u.api_key.clone())
            .ok_or_else(|| ServerError::UserNotFound(user_id.to_string()))
    }

    async fn set_api_key(&self, user_id: &str, envelope: StoredSecretEnvelope) -> ServerResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ServerError::UserNotFound(user_id.to_string()))?;
        user.api_key = Some(envelope);
        Ok(())
    }

    async fn unset_api_key(&self, user_id: &str) -> ServerResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ServerError::UserNotFound(user_id.to_string()))?;
        user.api_key = None;
        Ok(())
    }
}
