//! Traits for credential storage and session signalling
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (system keychain, application navigation).

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use super::types::Credentials;

/// Errors raised by a [`CredentialStore`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialStoreError {
    #[error("Credential storage unavailable: {0}")]
    AccessFailed(String),

    #[error("Stored credential is malformed: {0}")]
    Malformed(String),
}

/// Trait for credential persistence
///
/// Implementations hold exactly two values, the access token and the refresh
/// token, with process-wide lifetime. Reads of a missing value return
/// `Ok(None)`; only backend failures are errors.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read both credentials
    ///
    /// # Returns
    /// `Some` only when both tokens are present
    ///
    /// # Errors
    /// Returns error if the storage backend cannot be read
    async fn load(&self) -> Result<Option<Credentials>, CredentialStoreError> {
        let access = self.access_token().await?;
        let refresh = self.refresh_token().await?;
        Ok(access.zip(refresh).map(|(access, refresh)| Credentials::new(access, refresh)))
    }

    /// Read the stored access token
    ///
    /// # Errors
    /// Returns error if the storage backend cannot be read
    async fn access_token(&self) -> Result<Option<String>, CredentialStoreError>;

    /// Read the stored refresh token
    ///
    /// # Errors
    /// Returns error if the storage backend cannot be read
    async fn refresh_token(&self) -> Result<Option<String>, CredentialStoreError>;

    /// Persist both credentials, replacing whatever was stored
    ///
    /// # Errors
    /// Returns error if the storage backend rejects the write
    async fn store(&self, credentials: &Credentials) -> Result<(), CredentialStoreError>;

    /// Replace only the access token
    ///
    /// # Errors
    /// Returns error if the storage backend rejects the write
    async fn set_access_token(&self, access_token: &str) -> Result<(), CredentialStoreError>;

    /// Remove both credentials (idempotent)
    ///
    /// # Errors
    /// Returns error if the storage backend rejects the deletion
    async fn clear(&self) -> Result<(), CredentialStoreError>;
}

/// Receives the redirect-to-login signal
///
/// Called once per unrecoverable authentication failure, after the stored
/// credentials have been cleared.
pub trait SessionListener: Send + Sync {
    /// The session can no longer be recovered; navigate to `login_path`
    fn session_expired(&self, login_path: &str);
}

/// Default listener that only records the expiry in the logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSessionListener;

impl SessionListener for LoggingSessionListener {
    fn session_expired(&self, login_path: &str) {
        warn!(login_path = %login_path, "Session expired, sign-in required");
    }
}
