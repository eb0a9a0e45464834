//! Auth building blocks shared across Coursehub crates.
//!
//! # Feature Tiers
//!
//! - default: credential model, storage traits, endpoint policy and the
//!   single-flight refresh coordinator
//! - `platform`: platform keychain credential storage (`keyring`)
//! - `test-utils`: in-memory mocks for downstream test suites

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{
    CredentialStore, CredentialStoreError, Credentials, EndpointPolicy, LoggingSessionListener,
    PendingQueue, RefreshCoordinator, RefreshError, RefreshOutcome, RefreshTicket,
    SessionListener, TokenManager, TokenRefreshRequest, TokenRefreshResponse,
};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider};
