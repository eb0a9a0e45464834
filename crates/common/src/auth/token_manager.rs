//! Credential lifecycle management
//!
//! Manages the session credential pair:
//! - Load from the credential store at client construction
//! - Store both tokens after login
//! - Apply a token-refresh response in place
//! - Clear both tokens on logout or unrecoverable failure

use std::sync::Arc;

use tracing::{debug, info};

use super::traits::{CredentialStore, CredentialStoreError};
use super::types::{Credentials, TokenRefreshResponse};

/// Token manager over an injected [`CredentialStore`]
///
/// Reads always go to the store, so a token written by another client
/// instance sharing the same store is picked up on the next request.
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `store` - Credential persistence backend
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Check the store for an existing session
    ///
    /// Should be called on startup.
    ///
    /// # Returns
    /// `true` if a complete credential pair is stored
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub async fn initialize(&self) -> Result<bool, CredentialStoreError> {
        match self.store.load().await? {
            Some(_) => {
                info!("Token manager initialized with existing credentials");
                Ok(true)
            }
            None => {
                debug!("No stored credentials found");
                Ok(false)
            }
        }
    }

    /// Current access token, if any
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub async fn access_token(&self) -> Result<Option<String>, CredentialStoreError> {
        self.store.access_token().await
    }

    /// Current refresh token, if any
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub async fn refresh_token(&self) -> Result<Option<String>, CredentialStoreError> {
        self.store.refresh_token().await
    }

    /// Both credentials, or `None` unless both are present
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub async fn credentials(&self) -> Result<Option<Credentials>, CredentialStoreError> {
        self.store.load().await
    }

    /// Whether a complete credential pair is stored
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.store.load().await, Ok(Some(_)))
    }

    /// Store a fresh credential pair (after login)
    ///
    /// # Errors
    /// Returns error if the store rejects the write
    pub async fn store(&self, credentials: &Credentials) -> Result<(), CredentialStoreError> {
        self.store.store(credentials).await?;
        info!("Credentials stored");
        Ok(())
    }

    /// Apply a successful token-refresh response
    ///
    /// Replaces the access token; when the backend rotated the refresh token
    /// too, both are written together.
    ///
    /// # Returns
    /// The new access token
    ///
    /// # Errors
    /// Returns error if the store rejects the write
    pub async fn apply_refresh(
        &self,
        response: TokenRefreshResponse,
    ) -> Result<String, CredentialStoreError> {
        match response.refresh {
            Some(refresh) => {
                let credentials = Credentials::new(response.access.clone(), refresh);
                self.store.store(&credentials).await?;
                debug!("Stored refreshed access token and rotated refresh token");
            }
            None => {
                self.store.set_access_token(&response.access).await?;
                debug!("Stored refreshed access token");
            }
        }

        Ok(response.access)
    }

    /// Clear both credentials (logout)
    ///
    /// # Errors
    /// Returns error if the store rejects the deletion
    pub async fn clear(&self) -> Result<(), CredentialStoreError> {
        self.store.clear().await?;
        info!("Credentials cleared (logged out)");
        Ok(())
    }
}
