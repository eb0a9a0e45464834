//! Testing utilities and helpers
//!
//! - **[`mocks`]**: in-memory credential store and a recording session
//!   listener
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use coursehub_common::testing::{MockCredentialStore, RecordingSessionListener};
//!
//! let store = Arc::new(MockCredentialStore::with_credentials("T1", "R1"));
//! let listener = Arc::new(RecordingSessionListener::new());
//! assert_eq!(store.snapshot().0.as_deref(), Some("T1"));
//! assert_eq!(listener.expirations(), 0);
//! ```

pub mod mocks;

pub use mocks::{MockCredentialStore, RecordingSessionListener};
