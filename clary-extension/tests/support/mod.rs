//! Shared fakes for extension tests.

#![allow(dead_code)]

use clary_extension::{ExtensionError, ExtensionResult, KeyBackend, LocalStore, MemoryStore};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Memory store with injectable latency and failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_remove: AtomicBool,
    /// Write attempts, `set` and `set_if_absent` alike.
    pub sets: AtomicUsize,
    /// Applied after the read, so concurrent readers all see the same
    /// (stale) value before any of them can write.
    pub get_delay: Option<Duration>,
}

impl FlakyStore {
    pub fn slow(delay: Duration) -> Self {
        Self {
            get_delay: Some(delay),
            ..Self::default()
        }
    }
}

impl LocalStore for FlakyStore {
    async fn get(&self, key: &str) -> ExtensionResult<Option<String>> {
        let value = self.inner.get(key).await?;
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> ExtensionResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn set_if_absent(&self, key: &str, value: String) -> ExtensionResult<String> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set_if_absent(key, value).await
    }

    async fn remove(&self, keys: &[&str]) -> ExtensionResult<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(ExtensionError::Storage("quota exceeded".into()));
        }
        self.inner.remove(keys).await
    }
}

/// What the fake backend should answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Unauthorized,
    ServerError,
}

impl Reply {
    fn into_result(self) -> ExtensionResult<()> {
        match self {
            Reply::Ok => Ok(()),
            Reply::Unauthorized => Err(ExtensionError::SessionExpired),
            Reply::ServerError => Err(ExtensionError::Backend {
                status: 500,
                message: "Internal server error".into(),
            }),
        }
    }
}

/// In-process backend that records calls.
pub struct FakeBackend {
    pub calls: Mutex<Vec<String>>,
    pub saved_key: Mutex<Option<String>>,
    pub save_reply: Reply,
    pub delete_reply: Reply,
    pub logout_reply: Reply,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            saved_key: Mutex::new(None),
            save_reply: Reply::Ok,
            delete_reply: Reply::Ok,
            logout_reply: Reply::Ok,
        }
    }
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl KeyBackend for FakeBackend {
    async fn save_api_key(&self, token: &str, api_key: &str) -> ExtensionResult<()> {
        self.record(format!("save:{token}"));
        self.save_reply.into_result()?;
        *self.saved_key.lock().unwrap() = Some(api_key.to_string());
        Ok(())
    }

    async fn api_key_status(&self, token: &str) -> ExtensionResult<bool> {
        self.record(format!("status:{token}"));
        Ok(self.saved_key.lock().unwrap().is_some())
    }

    async fn delete_api_key(&self, token: &str) -> ExtensionResult<()> {
        self.record(format!("delete:{token}"));
        self.delete_reply.into_result()?;
        *self.saved_key.lock().unwrap() = None;
        Ok(())
    }

    async fn logout(&self, token: &str) -> ExtensionResult<()> {
        self.record(format!("logout:{token}"));
        self.logout_reply.into_result()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const SAMPLE_KEY: &str = "gk_abc123def456ghi789jkl012";
pub const SAMPLE_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJpZCI6InUxIn0.c2ln";
