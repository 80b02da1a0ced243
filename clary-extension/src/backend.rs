//! HTTP client for the backend's API-key and logout endpoints.
//!
//! Authenticates with the cached bearer token. There is no refresh flow:
//! a `401` means the token is dead and maps to
//! [`ExtensionError::SessionExpired`].

use crate::config::ExtensionConfig;
use crate::error::{ExtensionError, ExtensionResult};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// The server half of the credential lifecycle.
pub trait KeyBackend: Send + Sync {
    /// Sends the plaintext key; the server encrypts it under its own key.
    fn save_api_key(
        &self,
        token: &str,
        api_key: &str,
    ) -> impl Future<Output = ExtensionResult<()>> + Send;

    fn api_key_status(&self, token: &str) -> impl Future<Output = ExtensionResult<bool>> + Send;

    fn delete_api_key(&self, token: &str) -> impl Future<Output = ExtensionResult<()>> + Send;

    fn logout(&self, token: &str) -> impl Future<Output = ExtensionResult<()>> + Send;
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(rename = "hasApiKey")]
    has_api_key: bool,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// reqwest implementation of [`KeyBackend`].
pub struct BackendClient {
    client: Client,
    config: ExtensionConfig,
}

impl BackendClient {
    pub fn new(config: ExtensionConfig) -> ExtensionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Maps non-success responses to errors.
    async fn check(resp: Response) -> ExtensionResult<Response> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ExtensionError::SessionExpired);
        }
        if status.is_success() {
            return Ok(resp);
        }

        let body: ErrorBody = resp.json().await.unwrap_or_default();
        let message = body
            .error
            .or(body.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        Err(ExtensionError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

impl KeyBackend for BackendClient {
    async fn save_api_key(&self, token: &str, api_key: &str) -> ExtensionResult<()> {
        let resp = self
            .client
            .post(self.url("/user/apikey"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "apiKey": api_key }))
            .send()
            .await?;
        Self::check(resp).await?;
        debug!("API key saved on server");
        Ok(())
    }

    async fn api_key_status(&self, token: &str) -> ExtensionResult<bool> {
        let resp = self
            .client
            .get(self.url("/user/apikey/status"))
            .bearer_auth(token)
            .send()
            .await?;
        let status: StatusResponse = Self::check(resp).await?.json().await?;
        Ok(status.has_api_key)
    }

    async fn delete_api_key(&self, token: &str) -> ExtensionResult<()> {
        let resp = self
            .client
            .delete(self.url("/user/apikey"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(resp).await?;
        debug!("API key deleted on server");
        Ok(())
    }

    async fn logout(&self, token: &str) -> ExtensionResult<()> {
        let resp = self
            .client
            .post(self.url("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
