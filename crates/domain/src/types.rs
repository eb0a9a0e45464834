//! Wire types shared by the auth flow and the resource APIs
//!
//! Resource payloads (courses, modules, lessons, ...) are owned by the
//! backend contract and stay opaque here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page of results as returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Why an OTP is being requested or verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    Registration,
}

/// Body of `POST /auth/request_otp/`
#[derive(Debug, Clone, Serialize)]
pub struct OtpRequest<'a> {
    pub email: &'a str,
    pub purpose: OtpPurpose,
}

/// Body of `POST /auth/verify_otp/`
#[derive(Debug, Clone, Serialize)]
pub struct OtpVerification<'a> {
    pub email: &'a str,
    pub otp: &'a str,
    pub purpose: OtpPurpose,
}

/// Successful login: both credentials plus the user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: Value,
}

/// Bare acknowledgement body (`{"message": "..."}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Query parameters accepted by list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

impl ListParams {
    /// Only include soft-deleted rows when `show_deleted` is set
    #[must_use]
    pub fn with_deleted(show_deleted: bool) -> Self {
        Self { show_deleted: Some(show_deleted), ..Self::default() }
    }

    /// Flatten into `(key, value)` pairs, skipping unset fields
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(show_deleted) = self.show_deleted {
            pairs.push(("show_deleted".to_string(), show_deleted.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(view) = &self.view {
            pairs.push(("view".to_string(), view.clone()));
        }
        if let Some(ordering) = &self.ordering {
            pairs.push(("ordering".to_string(), ordering.clone()));
        }
        pairs
    }
}
