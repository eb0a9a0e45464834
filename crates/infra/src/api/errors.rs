//! API-specific error types
//!
//! Provides error classification for API operations. Non-2xx responses keep
//! their status and body untouched so callers can inspect them.

use coursehub_common::{CredentialStoreError, RefreshError};
use coursehub_domain::CoursehubError;
use reqwest::StatusCode;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403, failed refresh, no session)
    Authentication,
    /// Rate limiting errors (429)
    RateLimit,
    /// Server errors (5xx)
    Server,
    /// Client errors (4xx except auth) and rejected input
    Client,
    /// Network/connection errors and timeouts
    Network,
    /// Configuration and local storage errors
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{url} returned status {status}")]
    Status { status: StatusCode, url: String, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("No access token stored, sign-in required")]
    NotAuthenticated,

    #[error("Session refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Credential storage error: {0}")]
    Storage(#[from] CredentialStoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No account found with this email address. Please register first.")]
    AccountNotFound,

    #[error("Registration request is pending approval")]
    RegistrationPending,

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Status { status, .. } => {
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN {
                    ApiErrorCategory::Authentication
                } else if *status == StatusCode::TOO_MANY_REQUESTS {
                    ApiErrorCategory::RateLimit
                } else if status.is_server_error() {
                    ApiErrorCategory::Server
                } else {
                    ApiErrorCategory::Client
                }
            }
            Self::NotAuthenticated | Self::Refresh(_) | Self::RegistrationPending => {
                ApiErrorCategory::Authentication
            }
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Decode(_) | Self::UnexpectedResponse(_) => ApiErrorCategory::Server,
            Self::InvalidInput(_) | Self::AccountNotFound => ApiErrorCategory::Client,
            Self::Storage(_) | Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// HTTP status carried by this error, if it came from a response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::AccountNotFound => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }

    /// Response body carried by this error, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether the backend answered 401
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Transport failures surface as network or timeout errors
impl From<CoursehubError> for ApiError {
    fn from(err: CoursehubError) -> Self {
        match err {
            CoursehubError::Timeout(message) => Self::Timeout(message),
            CoursehubError::Network(message) => Self::Network(message),
            CoursehubError::Config(message) => Self::Config(message),
            CoursehubError::InvalidInput(message) | CoursehubError::NotFound(message) => {
                Self::InvalidInput(message)
            }
            CoursehubError::Storage(message) => {
                Self::Storage(CredentialStoreError::AccessFailed(message))
            }
            CoursehubError::Auth(_) => Self::NotAuthenticated,
            CoursehubError::Internal(message) => Self::UnexpectedResponse(message),
        }
    }
}
