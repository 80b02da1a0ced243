//! Backend credential configuration.

use crate::error::{ServerError, ServerResult};
use clary_crypto::{KdfParams, ServerCodec};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable holding the server encryption secret.
pub const ENCRYPTION_SECRET_VAR: &str = "ENCRYPTION_SECRET";

/// Secret used when none is configured.
///
/// Anyone who knows this string can read every stored API key. It exists so
/// a development server starts without setup; production must set
/// `ENCRYPTION_SECRET`.
pub const FALLBACK_SECRET: &str = "fallback_secret";

/// Configuration for the stored-key envelope.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Secret the process key is derived from. `None` (or empty) selects
    /// [`FALLBACK_SECRET`].
    pub encryption_secret: Option<String>,

    /// scrypt cost. Must stay fixed for the lifetime of stored data.
    #[serde(default)]
    pub kdf: KdfParams,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field(
                "encryption_secret",
                &self.encryption_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("kdf", &self.kdf)
            .finish()
    }
}

impl ServerConfig {
    /// Reads `ENCRYPTION_SECRET` from the environment.
    pub fn from_env() -> Self {
        Self {
            encryption_secret: std::env::var(ENCRYPTION_SECRET_VAR).ok(),
            kdf: KdfParams::default(),
        }
    }

    /// Whether a real secret is configured.
    pub fn has_secret(&self) -> bool {
        self.encryption_secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// The secret to derive from, falling back (loudly) to [`FALLBACK_SECRET`].
    pub fn effective_secret(&self) -> &str {
        match self.encryption_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!(
                    "{ENCRYPTION_SECRET_VAR} is not set; using the built-in fallback \
                     secret. Stored API keys are NOT protected. Set \
                     {ENCRYPTION_SECRET_VAR} before deploying."
                );
                FALLBACK_SECRET
            }
        }
    }

    /// Errors instead of falling back. For deployments that must not start
    /// with the weak default.
    pub fn require_secret(&self) -> ServerResult<&str> {
        match self.encryption_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(ServerError::Config(format!(
                "{ENCRYPTION_SECRET_VAR} must be set"
            ))),
        }
    }

    /// Derives the process key and builds the codec. Slow.
    pub fn build_codec(&self) -> ServerResult<ServerCodec> {
        let codec = ServerCodec::from_secret(self.effective_secret(), &self.kdf)?;
        info!(fallback = !self.has_secret(), "server envelope key ready");
        Ok(codec)
    }
}
