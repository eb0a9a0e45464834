//! Coursehub backend API client
//!
//! HTTP-based client for the learning-platform REST API. It attaches the
//! stored access token to every non-public request and transparently
//! recovers from an expired token with a single shared refresh.
//!
//! # Architecture
//!
//! - Uses the [`HttpClient`](crate::http::HttpClient) transport (no direct
//!   reqwest in callers)
//! - Credentials come from a `CredentialStore` (platform keychain by default)
//! - Refresh state is owned per client; a failed refresh clears the session
//!   and signals the `SessionListener`
//! - Non-auth failures are returned verbatim and never retried
//!
//! # Module Organization
//!
//! - **[`client`]**: `ApiClient`, `ApiClientBuilder` and the refresh protocol
//! - **[`request`]**: request and response descriptors
//! - **[`auth`]**: OTP sign-in, session verification, logout
//! - **[`resources`]**: courses, modules, lessons, assessments, enrollments,
//!   access requests, users, organizations, stats
//! - **[`errors`]**: `ApiError`, `ApiErrorCategory`
//! - **[`notice`]**: user-facing `ErrorNotice`

pub mod auth;
pub mod client;
pub mod errors;
pub mod notice;
pub mod request;
pub mod resources;

pub use auth::AuthApi;
pub use client::{ApiClient, ApiClientBuilder};
pub use errors::{ApiError, ApiErrorCategory};
pub use notice::ErrorNotice;
pub use request::{ApiRequest, ApiResponse, MultipartPart, RequestBody};
pub use resources::CURRENT_USER;
