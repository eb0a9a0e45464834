//! Credential and token-refresh types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access and refresh token pair
///
/// Both values are opaque to the client. A pair is only ever constructed with
/// both tokens present; partially stored credentials are reported as absent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Short-lived bearer token attached to authenticated requests
    pub access_token: String,

    /// Longer-lived token used only against the token-refresh endpoint
    pub refresh_token: String,
}

impl Credentials {
    /// Create a new credential pair
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }

    /// Value for the `Authorization` header
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

// Tokens never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Body of the token-refresh call
#[derive(Debug, Clone, Serialize)]
pub struct TokenRefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Token-refresh response
///
/// The backend always returns a new access token; rotating backends also
/// return a new refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,

    #[serde(default)]
    pub refresh: Option<String>,
}
