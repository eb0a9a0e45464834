//! Client configuration structures

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_KEYCHAIN_SERVICE, DEFAULT_LOGIN_PATH, DEFAULT_TIMEOUT_SECS,
    PUBLIC_ENDPOINTS, TOKEN_REFRESH_PATH,
};

/// Configuration for the authenticated API client
///
/// Every field has a default, so partial config files and environment sets
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend API (e.g., "https://lms.example.com/api")
    pub base_url: String,
    /// Timeout applied to every request, in seconds
    pub timeout_secs: u64,
    /// Login entry point the application navigates to on session expiry
    pub login_path: String,
    /// Token-refresh endpoint, relative to `base_url`
    pub refresh_path: String,
    /// Paths that never receive an access token
    pub public_endpoints: Vec<String>,
    /// Keychain service name used for credential storage
    pub keychain_service: String,
    /// Optional User-Agent override
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_path: TOKEN_REFRESH_PATH.to_string(),
            public_endpoints: PUBLIC_ENDPOINTS.iter().map(ToString::to_string).collect(),
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            user_agent: None,
        }
    }
}
