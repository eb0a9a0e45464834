//! Mock implementations of auth traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{CredentialStore, CredentialStoreError, Credentials, SessionListener};

#[derive(Debug, Default)]
struct Slots {
    access: Option<String>,
    refresh: Option<String>,
}

/// In-memory credential store
///
/// # Examples
///
/// ```
/// use coursehub_common::testing::MockCredentialStore;
///
/// let store = MockCredentialStore::with_credentials("access", "refresh");
/// assert_eq!(store.snapshot(), (Some("access".into()), Some("refresh".into())));
/// ```
#[derive(Debug, Default)]
pub struct MockCredentialStore {
    slots: Mutex<Slots>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    clears: AtomicUsize,
}

impl MockCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding both tokens
    pub fn with_credentials(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        store.set_raw(Some(access), Some(refresh));
        store
    }

    /// Overwrite the slots directly, bypassing counters
    pub fn set_raw(&self, access: Option<&str>, refresh: Option<&str>) {
        let mut slots = self.slots.lock();
        slots.access = access.map(str::to_string);
        slots.refresh = refresh.map(str::to_string);
    }

    /// Current `(access, refresh)` values
    pub fn snapshot(&self) -> (Option<String>, Option<String>) {
        let slots = self.slots.lock();
        (slots.access.clone(), slots.refresh.clone())
    }

    /// Make every subsequent write fail with `AccessFailed`
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Number of successful `store`/`set_access_token` calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of successful `clear` calls
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), CredentialStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CredentialStoreError::AccessFailed("mock store is read-only".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn access_token(&self) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.slots.lock().access.clone())
    }

    async fn refresh_token(&self) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.slots.lock().refresh.clone())
    }

    async fn store(&self, credentials: &Credentials) -> Result<(), CredentialStoreError> {
        self.check_writable()?;
        let mut slots = self.slots.lock();
        slots.access = Some(credentials.access_token.clone());
        slots.refresh = Some(credentials.refresh_token.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_access_token(&self, access_token: &str) -> Result<(), CredentialStoreError> {
        self.check_writable()?;
        self.slots.lock().access = Some(access_token.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        self.check_writable()?;
        *self.slots.lock() = Slots::default();
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Session listener that records every redirect-to-login signal
#[derive(Debug, Default)]
pub struct RecordingSessionListener {
    login_paths: Mutex<Vec<String>>,
}

impl RecordingSessionListener {
    /// Create a listener with no recorded signals
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of session-expired signals received
    pub fn expirations(&self) -> usize {
        self.login_paths.lock().len()
    }

    /// Login path of the most recent signal
    pub fn last_login_path(&self) -> Option<String> {
        self.login_paths.lock().last().cloned()
    }
}

impl SessionListener for RecordingSessionListener {
    fn session_expired(&self, login_path: &str) {
        self.login_paths.lock().push(login_path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_store_roundtrip() {
        let store = MockCredentialStore::new();
        store.store(&Credentials::new("access123", "refresh456")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "access123");
        assert_eq!(loaded.refresh_token, "refresh456");
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_mock_store_failing_writes() {
        let store = MockCredentialStore::with_credentials("a", "r");
        store.fail_writes(true);

        assert!(store.clear().await.is_err());
        assert_eq!(store.snapshot(), (Some("a".into()), Some("r".into())));
    }

    #[test]
    fn test_recording_listener() {
        let listener = RecordingSessionListener::new();
        listener.session_expired("/login");
        listener.session_expired("/signin");

        assert_eq!(listener.expirations(), 2);
        assert_eq!(listener.last_login_path().as_deref(), Some("/signin"));
    }
}
