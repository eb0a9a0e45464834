//! # Coursehub Infrastructure
//!
//! Client-side infrastructure for the Coursehub learning-platform API.
//!
//! This crate contains:
//! - The reqwest-based HTTP transport
//! - The authenticated API client with single-flight token refresh
//! - OTP sign-in and typed resource endpoints
//! - Configuration loading and tracing initialisation
//!
//! ## Architecture
//! - Builds on the auth primitives in `coursehub-common`
//! - Depends on `coursehub-domain` for configuration and errors
//! - Contains all "impure" code (network, keychain, files)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, ApiError, ApiErrorCategory, ApiRequest, ApiResponse, AuthApi,
    ErrorNotice, MultipartPart, RequestBody,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
