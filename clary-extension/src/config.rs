//! Extension configuration.

use serde::{Deserialize, Serialize};

/// Settings for talking to the Clary backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Base URL of the REST API, including the `/api` prefix.
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            request_timeout_secs: 20,
        }
    }
}

impl ExtensionConfig {
    /// Config pointing at `base_url` (e.g. a mock server) with `/api` appended.
    pub fn for_base(base_url: &str) -> Self {
        Self {
            api_base_url: format!("{}/api", base_url.trim_end_matches('/')),
            ..Self::default()
        }
    }
}
