//! Process-wide codec handle.
//!
//! Services take an `Arc<ServerCodec>` so tests can inject codecs built from
//! other secrets. Binaries that want a single global call [`init_global`]
//! once at startup and pass the returned handle around.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use clary_crypto::ServerCodec;
use std::sync::{Arc, OnceLock};
use tracing::debug;

static GLOBAL: OnceLock<Arc<ServerCodec>> = OnceLock::new();

/// Derives the process key from `config` on first call; later calls return
/// the existing codec and ignore `config`.
///
/// Two threads racing the first call may both derive, but derivation is
/// deterministic and only one result is ever published.
pub fn init_global(config: &ServerConfig) -> ServerResult<Arc<ServerCodec>> {
    if let Some(codec) = GLOBAL.get() {
        return Ok(Arc::clone(codec));
    }

    let codec = Arc::new(config.build_codec()?);
    if GLOBAL.set(Arc::clone(&codec)).is_err() {
        debug!("global server codec initialised concurrently, using the published one");
    }

    GLOBAL
        .get()
        .cloned()
        .ok_or_else(|| ServerError::Config("global server codec missing after init".into()))
}

/// The global codec, if [`init_global`] has run.
pub fn global() -> Option<Arc<ServerCodec>> {
    GLOBAL.get().cloned()
}
