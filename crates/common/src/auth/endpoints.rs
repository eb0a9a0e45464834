//! Public endpoint policy
//!
//! Decides which request paths are exempt from credential injection and from
//! the refresh protocol. Matching is exact-or-prefix on the normalised path
//! (query string and fragment stripped, leading slash enforced).

use std::collections::BTreeSet;

use coursehub_domain::constants::{PUBLIC_ENDPOINTS, TOKEN_REFRESH_PATH};

/// Static set of unauthenticated paths plus the token-refresh path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPolicy {
    public: BTreeSet<String>,
    refresh_path: String,
}

impl EndpointPolicy {
    /// Create a policy from a list of public paths
    ///
    /// The refresh path is always treated as public. Empty entries are
    /// ignored so a blank config line cannot exempt every path.
    ///
    /// # Arguments
    /// * `public` - Paths that never receive an access token
    /// * `refresh_path` - Token-refresh endpoint
    pub fn new<I, S>(public: I, refresh_path: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let refresh_path = normalize(refresh_path.into().as_str());
        let mut public: BTreeSet<String> = public
            .into_iter()
            .filter(|entry| !entry.as_ref().trim().is_empty())
            .map(|entry| normalize(entry.as_ref().trim()))
            .collect();
        public.insert(refresh_path.clone());

        Self { public, refresh_path }
    }

    /// Whether `path` targets an unauthenticated endpoint
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize(path);
        self.public.iter().any(|entry| path == *entry || path.starts_with(entry.as_str()))
    }

    /// Whether `path` targets the token-refresh endpoint itself
    #[must_use]
    pub fn is_refresh(&self, path: &str) -> bool {
        let path = normalize(path);
        path == self.refresh_path || path.starts_with(self.refresh_path.as_str())
    }

    /// Token-refresh endpoint path
    #[must_use]
    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    /// Configured public paths, in sorted order
    pub fn public_paths(&self) -> impl Iterator<Item = &str> {
        self.public.iter().map(String::as_str)
    }
}

impl Default for EndpointPolicy {
    fn default() -> Self {
        Self::new(PUBLIC_ENDPOINTS, TOKEN_REFRESH_PATH)
    }
}

fn normalize(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
