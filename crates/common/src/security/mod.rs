//! Platform secret storage
//!
//! Generic keychain access used by the credential store. Token-specific
//! helpers live in `auth::keychain`, so this module never depends on auth
//! types.

pub mod keychain;

pub use keychain::{KeychainError, KeychainProvider};
