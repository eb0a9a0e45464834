use std::time::Duration;

use coursehub_domain::constants::DEFAULT_TIMEOUT_SECS;
use coursehub_domain::{ClientConfig, CoursehubError};
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, trace};

use crate::errors::InfraError;

/// User-Agent sent when the configuration does not override it
pub const DEFAULT_USER_AGENT: &str = concat!("coursehub-client/", env!("CARGO_PKG_VERSION"));

/// Single-attempt HTTP transport for the Coursehub backend
///
/// Status codes are never interpreted here: a 401 or a 500 comes back as an
/// ordinary [`Response`]. Only transport failures become errors, already
/// mapped into [`CoursehubError`]. Recovery from expired credentials lives
/// in the API client.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Transport with the default timeout and User-Agent
    pub fn new() -> Result<Self, CoursehubError> {
        Self::builder().build()
    }

    /// Transport configured from a [`ClientConfig`]
    pub fn from_config(config: &ClientConfig) -> Result<Self, CoursehubError> {
        let mut builder = Self::builder().timeout(config.timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }

    /// Start a request on the shared connection pool
    pub fn request<U: reqwest::IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.inner.request(method, url)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Put a request on the wire exactly once
    ///
    /// # Errors
    /// - `CoursehubError::InvalidInput` if the request cannot be built
    /// - `CoursehubError::Timeout` if no response arrives in time
    /// - `CoursehubError::Network` on connect or protocol failures
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, CoursehubError> {
        let request = builder.build().map_err(transport_error)?;
        let (method, url) = (request.method().clone(), request.url().clone());
        trace!(%method, %url, "HTTP request");

        let response = self.inner.execute(request).await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP transport failure");
            transport_error(err)
        })?;

        trace!(%method, %url, status = response.status().as_u16(), "HTTP response");
        Ok(response)
    }
}

fn transport_error(err: reqwest::Error) -> CoursehubError {
    InfraError::from(err).into()
}

/// Builder for [`HttpClient`]
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    connect_timeout: Option<Duration>,
    user_agent: String,
    default_headers: HeaderMap,
    system_proxy: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: HeaderMap::new(),
            system_proxy: false,
        }
    }
}

impl HttpClientBuilder {
    /// Whole-request timeout, connect through last body byte
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Headers sent on every request; later calls extend earlier ones
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Honour `HTTP(S)_PROXY` from the environment (off by default)
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    pub fn build(self) -> Result<HttpClient, CoursehubError> {
        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(self.default_headers);

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if !self.system_proxy {
            builder = builder.no_proxy();
        }

        let inner = builder.build().map_err(transport_error)?;
        Ok(HttpClient { inner, timeout: self.timeout })
    }
}
