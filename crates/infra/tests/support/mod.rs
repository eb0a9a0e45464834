//! Shared fixtures for the API client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use coursehub_common::testing::{MockCredentialStore, RecordingSessionListener};
use coursehub_domain::ClientConfig;
use coursehub_infra::ApiClient;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REFRESH_PATH: &str = "/auth/token_refresh/";

/// Mock backend plus a client wired to in-memory credentials.
pub struct Harness {
    pub server: MockServer,
    pub store: Arc<MockCredentialStore>,
    pub listener: Arc<RecordingSessionListener>,
    pub client: ApiClient,
}

impl Harness {
    /// Client holding access token `T1` and refresh token `R1`.
    pub async fn signed_in() -> Self {
        Self::with_store(MockCredentialStore::with_credentials("T1", "R1")).await
    }

    /// Client with no stored credentials.
    pub async fn signed_out() -> Self {
        Self::with_store(MockCredentialStore::new()).await
    }

    /// Signed-in client whose requests time out after `timeout_secs`.
    pub async fn signed_in_with_timeout(timeout_secs: u64) -> Self {
        let config = ClientConfig { timeout_secs, ..ClientConfig::default() };
        Self::build(MockCredentialStore::with_credentials("T1", "R1"), config).await
    }

    async fn with_store(store: MockCredentialStore) -> Self {
        Self::build(store, ClientConfig::default()).await
    }

    async fn build(store: MockCredentialStore, config: ClientConfig) -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(store);
        let listener = Arc::new(RecordingSessionListener::new());
        let client = ApiClient::builder()
            .config(config)
            .base_url(server.uri())
            .credential_store(store.clone())
            .session_listener(listener.clone())
            .build()
            .expect("api client should build");

        Self { server, store, listener, client }
    }

    /// `GET {route}` answers 401 for `T1` and `body` for `T2`.
    pub async fn mount_expiring(&self, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("Authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("Authorization", "Bearer T2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Refresh endpoint exchanging `R1` for `response`, answered after `delay`.
    pub async fn mount_refresh(&self, status: u16, response: serde_json::Value, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(json!({"refresh": "R1"})))
            .respond_with(ResponseTemplate::new(status).set_body_json(response).set_delay(delay))
            .expect(1)
            .named("token refresh")
            .mount(&self.server)
            .await;
    }

    /// Number of calls the backend saw on `route`.
    pub async fn calls_to(&self, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == route)
            .count()
    }
}
