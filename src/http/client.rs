//! HTTP client with retry and backoff
//!
//! Every call to an administration server goes through [`HttpClient`]:
//! credentials and the management headers are attached once, and
//! throttling, gateway errors, timeouts and refused connections are retried
//! with the configured backoff before the error reaches the registry.

use crate::config::{HttpSettings, Secret};
use crate::error::{Error, Result};
use crate::types::BackoffType;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any delay
    pub max_backoff: Duration,
    /// How the delay grows between retries
    pub backoff_type: BackoffType,
    /// Headers sent with every request
    pub default_headers: BTreeMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let settings = HttpSettings::default();
        Self {
            timeout: settings.timeout(),
            max_retries: settings.max_retries,
            initial_backoff: settings.initial_backoff(),
            max_backoff: settings.max_backoff(),
            backoff_type: settings.backoff,
            default_headers: BTreeMap::new(),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Config for the management API from the settings file section
    ///
    /// The management API rejects mutating requests without an
    /// `X-Requested-By` header.
    pub fn from_settings(settings: &HttpSettings) -> Self {
        Self::builder()
            .timeout(settings.timeout())
            .max_retries(settings.max_retries)
            .backoff(
                settings.backoff,
                settings.initial_backoff(),
                settings.max_backoff(),
            )
            .header("X-Requested-By", settings.requested_by.clone())
            .header("Accept", "application/json")
            .build()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: BTreeMap<String, String>,
    /// JSON body
    pub body: Option<Value>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Basic authentication credentials
#[derive(Debug, Clone)]
pub struct BasicAuth {
    /// User name
    pub username: String,
    /// Password
    pub password: Secret,
}

/// HTTP client with retry and backoff
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    auth: Option<BasicAuth>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            auth: None,
        })
    }

    /// Authenticate every request as this administrator
    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Secret) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password,
        });
        self
    }

    /// GET a URL and decode the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, config: RequestConfig) -> Result<T> {
        let response = self.request(Method::GET, url, config).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body
    pub async fn post(&self, url: &str, body: Value) -> Result<Response> {
        self.request(Method::POST, url, RequestConfig::new().json(body))
            .await
    }

    /// Send a request, retrying transient failures
    ///
    /// Any non-success status ends up as [`Error::HttpStatus`] carrying the
    /// response body, so activation errors reported by the server are kept.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            let error = match self.send_once(&method, url, &config).await {
                Ok(response) => {
                    debug!(%method, url, attempt, "Request succeeded");
                    return Ok(response);
                }
                Err(e) => e,
            };

            if attempt >= max_retries || !error.is_retryable() {
                return Err(error);
            }

            let delay = self.calculate_backoff(attempt);
            attempt += 1;
            warn!(
                %method,
                url,
                error = %error,
                attempt,
                max_attempts = max_retries + 1,
                ?delay,
                "Retrying request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(&self, method: &Method, url: &str, config: &RequestConfig) -> Result<Response> {
        let response = self
            .prepare(method.clone(), url, config)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    }
                } else {
                    Error::Http(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::http_status(status.as_u16(), body))
    }

    fn prepare(&self, method: Method, url: &str, config: &RequestConfig) -> RequestBuilder {
        let mut req = self.client.request(method, url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !config.query.is_empty() {
            req = req.query(&config.query);
        }
        if let Some(body) = &config.body {
            req = req.json(body);
        }
        if let Some(auth) = &self.auth {
            req = req.basic_auth(&auth.username, Some(auth.password.expose()));
        }
        req
    }

    /// Delay before retry number `attempt + 1`, capped at `max_backoff`
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_backoff;
        let delay = match self.config.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => initial.saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_auth", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}
