//! Backend side of Clary credential storage.
//!
//! - [`config`]: where the server secret comes from, and the weak fallback
//! - [`process_key`]: derive-once handle to the [`ServerCodec`]
//! - [`user_store`]: the single optional `apiKey` field on user records
//! - [`api_key`]: save / status / delete / use, as called by the HTTP layer
//!
//! Routing, authentication and the LLM call itself live in the web service;
//! they see plaintext only through [`ApiKeyService`].

pub mod api_key;
pub mod config;
pub mod error;
pub mod process_key;
pub mod user_store;

pub use api_key::{ApiKeyLookup, ApiKeyService, UpstreamError};
pub use clary_crypto::{ServerCodec, StoredSecretEnvelope};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use user_store::{MemoryUserStore, UserRecord, UserStore};
