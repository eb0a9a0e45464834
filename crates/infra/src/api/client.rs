//! Authenticated API client with single-flight token refresh
//!
//! Every request to a non-public endpoint carries the stored access token.
//! A 401 on such a request triggers at most one refresh per client, shared
//! by every request that failed while it was in flight; each of them is then
//! replayed once with the new token. A failed refresh clears the stored
//! credentials and signals the session listener.

use std::sync::Arc;

use coursehub_common::auth::TokenRefreshRequest;
use coursehub_common::{
    CredentialStore, EndpointPolicy, KeychainProvider, LoggingSessionListener,
    RefreshCoordinator, RefreshError, RefreshOutcome, RefreshTicket, SessionListener,
    TokenManager, TokenRefreshResponse,
};
use coursehub_domain::ClientConfig;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::errors::ApiError;
use super::request::{ApiRequest, ApiResponse, RequestBody};
use crate::http::HttpClient;

/// API client for the Coursehub backend
///
/// One instance owns its own refresh state; independent clients never share
/// a refresh cycle even when they share a credential store.
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    login_path: String,
    policy: EndpointPolicy,
    tokens: TokenManager,
    coordinator: RefreshCoordinator,
    listener: Arc<dyn SessionListener>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("login_path", &self.login_path)
            .field("policy", &self.policy)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Base URL every request path is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Route the session listener is told to navigate to
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Credential lifecycle for this client
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Public endpoint policy in force
    pub fn policy(&self) -> &EndpointPolicy {
        &self.policy
    }

    /// Whether a token refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    /// Number of refresh cycles this client has started
    pub fn refresh_cycles(&self) -> u64 {
        self.coordinator.cycles()
    }

    /// Send a request, recovering once from an expired access token
    ///
    /// Public endpoints are sent without credentials and any status is
    /// returned as-is. Other endpoints require a stored access token; a 401
    /// runs the refresh protocol and replays the request exactly once.
    ///
    /// # Errors
    ///
    /// - `ApiError::Status` for any non-2xx response that is not recovered
    /// - `ApiError::NotAuthenticated` when no access token is stored
    /// - `ApiError::Refresh` when the session could not be refreshed
    /// - `ApiError::Network` / `ApiError::Timeout` for transport failures
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        if request.headers.remove(AUTHORIZATION).is_some() {
            warn!("Caller-supplied Authorization header dropped");
        }

        if self.policy.is_public(&request.path) {
            return self.dispatch(&request, None).await?.error_for_status();
        }

        let Some(token) = self.tokens.access_token().await? else {
            warn!("No access token stored, redirecting to sign-in");
            self.listener.session_expired(&self.login_path);
            return Err(ApiError::NotAuthenticated);
        };

        let response = self.dispatch(&request, Some(&token)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return response.error_for_status();
        }

        debug!("Access token rejected, recovering session");
        let token = self.recover_session(&token).await?;

        // Replay goes straight to the transport so it can never refresh again.
        self.dispatch(&request, Some(&token)).await?.error_for_status()
    }

    /// Send a request and deserialize the JSON body
    ///
    /// # Errors
    /// Same as [`ApiClient::send`], plus `ApiError::Decode`
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    /// Execute a GET request
    ///
    /// # Errors
    /// Returns error if request fails or response cannot be deserialized
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_json(ApiRequest::get(path)).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    /// Returns error if request fails or response cannot be deserialized
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request_json(ApiRequest::post(path).json(body)?).await
    }

    /// Execute a PUT request with a JSON body
    ///
    /// # Errors
    /// Returns error if request fails or response cannot be deserialized
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request_json(ApiRequest::put(path).json(body)?).await
    }

    /// Execute a PATCH request with a JSON body
    ///
    /// # Errors
    /// Returns error if request fails or response cannot be deserialized
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request_json(ApiRequest::patch(path).json(body)?).await
    }

    /// Execute a DELETE request
    ///
    /// # Errors
    /// Returns error if request fails or response cannot be deserialized
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_json(ApiRequest::delete(path)).await
    }

    /// Obtain a usable access token after `rejected` got a 401
    ///
    /// A follower whose leader was cancelled mid-refresh joins or starts a
    /// new cycle instead of failing; the stored session is still intact.
    async fn recover_session(&self, rejected: &str) -> Result<String, ApiError> {
        loop {
            if let Some(current) = self.tokens.access_token().await? {
                if current != rejected {
                    debug!("Access token already refreshed, replaying");
                    return Ok(current);
                }
            }

            match self.coordinator.begin() {
                RefreshTicket::Leader(guard) => {
                    // A cycle may have settled between the check above and begin().
                    let outcome = match self.tokens.access_token().await {
                        Ok(Some(current)) if current != rejected => Ok(()),
                        _ => self.refresh_session().await,
                    };
                    let outcome = guard.finish(outcome);
                    if outcome.is_err() {
                        self.listener.session_expired(&self.login_path);
                    }
                    outcome?;
                }
                RefreshTicket::Follower(waiter) => match waiter.wait().await {
                    Err(RefreshError::Abandoned) => {
                        debug!("Refresh leader was cancelled, retrying recovery");
                        continue;
                    }
                    outcome => outcome?,
                },
            }

            return self.tokens.access_token().await?.ok_or(ApiError::NotAuthenticated);
        }
    }

    /// Perform one refresh call; clears the credentials on failure
    async fn refresh_session(&self) -> RefreshOutcome {
        let outcome = self.request_new_token().await;

        match &outcome {
            Ok(()) => info!("Access token refreshed"),
            Err(err) => {
                warn!(error = %err, "Token refresh failed, clearing credentials");
                if let Err(clear_err) = self.tokens.clear().await {
                    warn!(error = %clear_err, "Failed to clear credentials after refresh failure");
                }
            }
        }

        outcome
    }

    async fn request_new_token(&self) -> RefreshOutcome {
        let refresh = self
            .tokens
            .refresh_token()
            .await
            .map_err(|err| RefreshError::Storage(err.to_string()))?
            .ok_or(RefreshError::MissingRefreshToken)?;

        let request = ApiRequest::post(self.policy.refresh_path())
            .json(&TokenRefreshRequest { refresh: &refresh })
            .map_err(|err| RefreshError::Network(err.to_string()))?;

        let response = self
            .dispatch(&request, None)
            .await
            .map_err(|err| RefreshError::Network(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RefreshError::Rejected {
                status: response.status().as_u16(),
                body: response.text(),
            });
        }

        let body: TokenRefreshResponse = serde_json::from_slice(response.body())
            .map_err(|err| RefreshError::InvalidResponse(err.to_string()))?;

        self.tokens.apply_refresh(body).await.map_err(|err| RefreshError::Storage(err.to_string()))?;
        Ok(())
    }

    /// Put one request on the wire and buffer the response
    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, url = %url, authenticated = token.is_some(), "Dispatching request");

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(RequestBody::to_form(parts)?),
        };

        let response = self.http.send(builder).await?;
        let status = response.status();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|err| {
            if err.is_timeout() {
                ApiError::Timeout(err.to_string())
            } else {
                ApiError::Network(format!("failed to read response body: {err}"))
            }
        })?;

        debug!(status = %status, url = %url, "Received response");
        Ok(ApiResponse { status, url, headers, body: body.to_vec() })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    store: Option<Arc<dyn CredentialStore>>,
    listener: Option<Arc<dyn SessionListener>>,
    policy: Option<EndpointPolicy>,
    http: Option<HttpClient>,
}

impl ApiClientBuilder {
    /// Set the client configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override only the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.get_or_insert_with(ClientConfig::default).base_url = base_url.into();
        self
    }

    /// Set the credential store (defaults to the platform keychain)
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the session-expired listener (defaults to logging only)
    pub fn session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Override the public endpoint policy derived from the config
    pub fn endpoint_policy(mut self, policy: EndpointPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Use a preconfigured transport
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL is invalid or the
    /// transport cannot be created
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();

        let parsed = Url::parse(&config.base_url)
            .map_err(|err| ApiError::Config(format!("invalid base URL '{}': {err}", config.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "unsupported base URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::from_config(&config)
                .map_err(|err| ApiError::Config(format!("Failed to build HttpClient: {err}")))?,
        };

        let policy = self.policy.unwrap_or_else(|| {
            EndpointPolicy::new(&config.public_endpoints, config.refresh_path.as_str())
        });
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(KeychainProvider::new(config.keychain_service.clone())));
        let listener = self.listener.unwrap_or_else(|| Arc::new(LoggingSessionListener));

        Ok(ApiClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login_path: config.login_path,
            policy,
            tokens: TokenManager::new(store),
            coordinator: RefreshCoordinator::new(),
            listener,
        })
    }
}
