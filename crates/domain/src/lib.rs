//! # Coursehub Domain
//!
//! Domain types shared by the Coursehub API client crates.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Client configuration structures
//! - Endpoint and storage constants
//! - Small wire types shared by the auth flow and resource APIs
//!
//! ## Architecture
//! - No dependencies on other Coursehub crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
