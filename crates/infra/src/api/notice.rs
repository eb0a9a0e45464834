//! User-facing error notices
//!
//! Turns an [`ApiError`] into a short title and a readable message. The
//! backend reports failures as `{"error": {"message", "code", "details"}}`;
//! plain-text bodies are shown as-is.

use serde_json::{Map, Value};

use super::errors::ApiError;

const DEFAULT_TITLE: &str = "Error";
const DEFAULT_MESSAGE: &str = "An error occurred";
const REGISTRATION_PENDING_MESSAGE: &str =
    "Your registration request has been submitted. You will receive an email once approved.";

/// Message keywords that override the title, checked in order
const KEYWORD_TITLES: [(&str, &str); 10] = [
    ("pending approval", "Approval Pending"),
    ("no account found", "Account Not Found"),
    ("inactive", "Account Inactive"),
    ("already exists", "Account Exists"),
    ("rejected", "Registration Rejected"),
    ("invalid credentials", "Invalid Credentials"),
    ("unauthorized", "Unauthorized"),
    ("forbidden", "Access Denied"),
    ("not found", "Not Found"),
    ("invalid email domain", "Invalid Email Domain"),
];

/// Title and message suitable for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub title: String,
    pub message: String,
}

impl ErrorNotice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { title: title.into(), message: message.into() }
    }
}

impl Default for ErrorNotice {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, DEFAULT_MESSAGE)
    }
}

impl From<&ApiError> for ErrorNotice {
    fn from(err: &ApiError) -> Self {
        let (title, message) = match err {
            ApiError::Status { body, .. } => from_body(body),
            ApiError::RegistrationPending => {
                (title_for_code(400).to_string(), REGISTRATION_PENDING_MESSAGE.to_string())
            }
            ApiError::AccountNotFound => (title_for_code(404).to_string(), err.to_string()),
            other => (DEFAULT_TITLE.to_string(), other.to_string()),
        };

        let title = keyword_title(&message).map_or(title, str::to_string);
        Self { title, message }
    }
}

impl From<ApiError> for ErrorNotice {
    fn from(err: ApiError) -> Self {
        Self::from(&err)
    }
}

fn from_body(body: &str) -> (String, String) {
    let default = (DEFAULT_TITLE.to_string(), DEFAULT_MESSAGE.to_string());

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("error") {
            Some(Value::Object(error)) => structured(error),
            _ => map
                .get("detail")
                .and_then(Value::as_str)
                .map_or(default, |detail| (DEFAULT_TITLE.to_string(), detail.to_string())),
        },
        Ok(Value::String(text)) if !text.is_empty() => (DEFAULT_TITLE.to_string(), text),
        Ok(_) => default,
        Err(_) if !body.trim().is_empty() => (DEFAULT_TITLE.to_string(), body.to_string()),
        Err(_) => default,
    }
}

fn structured(error: &Map<String, Value>) -> (String, String) {
    let message = error.get("message").and_then(Value::as_str).unwrap_or(DEFAULT_MESSAGE);
    let title = error.get("code").and_then(Value::as_u64).map_or(DEFAULT_TITLE, title_for_code);

    let message = match error.get("details") {
        None | Some(Value::Null) => message.to_string(),
        Some(Value::Object(details)) if details.is_empty() => message.to_string(),
        Some(Value::Object(details)) => {
            let parts: Vec<String> =
                details.iter().map(|(key, value)| format!("{key}: {}", plain(value))).collect();
            format!("{message} ({})", parts.join(", "))
        }
        Some(other) => format!("{message} ({})", plain(other)),
    };

    (title.to_string(), message)
}

fn title_for_code(code: u64) -> &'static str {
    match code {
        400 => "Validation Error",
        401 => "Unauthorized",
        403 => "Access Denied",
        404 => "Not Found",
        500 => "Server Error",
        _ => DEFAULT_TITLE,
    }
}

fn keyword_title(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    KEYWORD_TITLES.iter().find(|(keyword, _)| lower.contains(keyword)).map(|(_, title)| *title)
}

/// Strings without quotes, arrays comma-joined, everything else as JSON
fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(plain).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
