//! Session credential storage on top of `KeychainProvider`.
//!
//! The access and refresh tokens live under two fixed keys in the
//! provider's service namespace, mirroring the two-slot key-value layout the
//! backend's web client used.

use async_trait::async_trait;
use coursehub_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use tracing::debug;

use crate::auth::traits::{CredentialStore, CredentialStoreError};
use crate::auth::types::Credentials;
use crate::security::{KeychainError, KeychainProvider};

impl From<KeychainError> for CredentialStoreError {
    fn from(err: KeychainError) -> Self {
        Self::AccessFailed(err.to_string())
    }
}

#[async_trait]
impl CredentialStore for KeychainProvider {
    async fn access_token(&self) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.find_secret(ACCESS_TOKEN_KEY)?)
    }

    async fn refresh_token(&self) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.find_secret(REFRESH_TOKEN_KEY)?)
    }

    async fn store(&self, credentials: &Credentials) -> Result<(), CredentialStoreError> {
        debug!(service = %self.service_name(), "Storing session credentials");
        self.set_secret(ACCESS_TOKEN_KEY, &credentials.access_token)?;
        self.set_secret(REFRESH_TOKEN_KEY, &credentials.refresh_token)?;
        Ok(())
    }

    async fn set_access_token(&self, access_token: &str) -> Result<(), CredentialStoreError> {
        Ok(self.set_secret(ACCESS_TOKEN_KEY, access_token)?)
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        debug!(service = %self.service_name(), "Deleting session credentials");
        // Both keys are deleted before any failure is reported.
        let access = self.delete_secret(ACCESS_TOKEN_KEY);
        let refresh = self.delete_secret(REFRESH_TOKEN_KEY);
        access?;
        refresh?;
        Ok(())
    }
}
