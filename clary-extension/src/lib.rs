//! Extension side of Clary credential storage.
//!
//! Keeps local storage free of plaintext secrets: a per-installation key
//! ([`install_secret`]) encrypts the cached bearer token and API key
//! ([`session`]). [`lifecycle`] coordinates the local cache with the
//! backend ([`backend`]) on save, delete and logout.

pub mod backend;
pub mod config;
pub mod error;
pub mod install_secret;
pub mod lifecycle;
pub mod session;
pub mod storage;

pub use backend::{BackendClient, KeyBackend};
pub use config::ExtensionConfig;
pub use error::{ExtensionError, ExtensionResult};
pub use install_secret::InstallSecretManager;
pub use lifecycle::CredentialLifecycle;
pub use session::SessionCache;
pub use storage::{FileStore, LocalStore, MemoryStore};
