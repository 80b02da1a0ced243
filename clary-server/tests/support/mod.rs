//! Shared helpers for backend integration tests.

#![allow(dead_code)]

use clary_crypto::{KdfParams, ServerCodec};
use clary_server::{ApiKeyService, MemoryUserStore, ServerConfig};
use std::sync::Arc;

/// Config with a real secret and cheap scrypt costs.
pub fn test_config(secret: &str) -> ServerConfig {
    ServerConfig {
        encryption_secret: Some(secret.to_string()),
        kdf: KdfParams::insecure_fast(),
    }
}

pub fn test_codec(secret: &str) -> Arc<ServerCodec> {
    Arc::new(test_config(secret).build_codec().expect("codec must build"))
}

/// Service over a fresh store with one registered user.
pub async fn service_with_user() -> (ApiKeyService<MemoryUserStore>, String) {
    let store = MemoryUserStore::new();
    let user_id = store.create_user("test@example.com").await;
    (ApiKeyService::new(store, test_codec("integration-secret")), user_id)
}

/// Installs a test subscriber so `RUST_LOG=debug cargo test` shows logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const SAMPLE_KEY: &str = "gk_abc123def456ghi789jkl012";
