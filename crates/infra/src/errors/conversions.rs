//! Mapping of transport failures into domain errors.

use coursehub_domain::CoursehubError;
use reqwest::StatusCode;

/// Infrastructure-side wrapper around [`CoursehubError`]
///
/// Foreign error types convert into this newtype (the orphan rule forbids
/// implementing `From<reqwest::Error>` in the domain crate) and it unwraps
/// into the domain error with `.into()`.
#[derive(Debug)]
pub struct InfraError(pub CoursehubError);

impl From<InfraError> for CoursehubError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CoursehubError> for InfraError {
    fn from(value: CoursehubError) -> Self {
        Self(value)
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(err: reqwest::Error) -> Self {
        let mapped = if err.is_timeout() {
            CoursehubError::Timeout(format!("request to {} timed out", target(&err)))
        } else if err.is_connect() {
            CoursehubError::Network(format!("could not connect to {}", target(&err)))
        } else if err.is_builder() {
            CoursehubError::InvalidInput(format!("invalid HTTP request: {err}"))
        } else if let Some(status) = err.status() {
            from_status(status)
        } else {
            CoursehubError::Network(err.to_string())
        };

        Self(mapped)
    }
}

/// Domain error for a status surfaced through `error_for_status`
fn from_status(status: StatusCode) -> CoursehubError {
    let message = format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status")
    );

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CoursehubError::Auth(message),
        StatusCode::NOT_FOUND => CoursehubError::NotFound(message),
        s if s.is_client_error() => CoursehubError::InvalidInput(message),
        _ => CoursehubError::Network(message),
    }
}

fn target(err: &reqwest::Error) -> String {
    err.url().map_or_else(|| "backend".to_string(), |url| url.origin().ascii_serialization())
}
