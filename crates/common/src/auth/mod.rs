//! Session credentials and single-flight token refresh
//!
//! This module holds everything the authenticated API client needs that is
//! independent of the HTTP transport: the credential pair and its storage,
//! the public-endpoint policy, and the coordination state that guarantees at
//! most one token refresh is in flight per client.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  ApiClient (infra)   │  dispatch, 401 detection, replay
//! └─────────┬────────────┘
//!           │
//!           ├──► EndpointPolicy       (public paths, refresh path)
//!           ├──► RefreshCoordinator   (in-progress flag + PendingQueue)
//!           ├──► TokenManager         (credential lifecycle)
//!           │         │
//!           │         └──► CredentialStore  (keychain, in-memory)
//!           │
//!           └──► SessionListener      (redirect-to-login signal)
//! ```
//!
//! # Refresh lifecycle
//!
//! The first request to observe an expired access token calls
//! [`RefreshCoordinator::begin`] and becomes the leader. Requests that arrive
//! while the leader is refreshing receive a [`refresh::Waiter`] backed by a
//! slot in the [`PendingQueue`]. When the leader settles, the whole queue is
//! resolved with the same [`RefreshOutcome`] and the in-progress flag is
//! cleared in the same critical section.
//!
//! # Module Organization
//!
//! - **[`types`]**: `Credentials` and the token-refresh wire types
//! - **[`traits`]**: `CredentialStore`, `SessionListener`
//! - **[`endpoints`]**: `EndpointPolicy`
//! - **[`pending`]**: `PendingQueue`
//! - **[`refresh`]**: `RefreshCoordinator`, `RefreshError`
//! - **[`token_manager`]**: `TokenManager`

pub mod endpoints;
#[cfg(feature = "platform")]
mod keychain;
pub mod pending;
pub mod refresh;
pub mod token_manager;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use endpoints::EndpointPolicy;
pub use pending::PendingQueue;
pub use refresh::{RefreshCoordinator, RefreshError, RefreshOutcome, RefreshTicket};
pub use token_manager::TokenManager;
pub use traits::{CredentialStore, CredentialStoreError, LoggingSessionListener, SessionListener};
pub use types::{Credentials, TokenRefreshRequest, TokenRefreshResponse};
