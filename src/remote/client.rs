//! Authenticated HTTP client for the remote task API

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::{RemoteError, Result};
use super::retry::RetryPolicy;

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://api.clickup.com/api/v2";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    pub user_agent: String,

    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("task-cli/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// JSON-over-HTTPS client with token authentication and retries
///
/// Every call goes through the configured [`RetryPolicy`], including
/// non-idempotent POSTs: a retried create may therefore be applied twice by
/// the server.
pub struct RemoteClient {
    inner: reqwest::Client,
    base_url: Url,
    token: String,
    retry: RetryPolicy,
}

impl RemoteClient {
    pub fn new(token: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| RemoteError::BuildError(e.to_string()))?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        Ok(Self {
            inner,
            base_url,
            token: token.into(),
            retry: config.retry,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs a request and returns the decoded JSON body
    ///
    /// An empty success body decodes as `Value::Null`.
    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.send(method, path, &[], body).await
    }

    /// Like [`RemoteClient::request`], with query parameters
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(path)?;
        self.retry
            .run(|attempt| self.attempt(method.clone(), url.clone(), query, body, attempt))
            .await
    }

    /// Performs a request and decodes the body into a typed schema
    pub async fn send_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<T> {
        let value = self.send(method, path, query, body).await?;
        serde_json::from_value(value).map_err(|source| RemoteError::Decode {
            path: path.to_string(),
            source,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| RemoteError::InvalidUrl(format!("{joined}: {e}")))
    }

    async fn attempt(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, &str)],
        body: Option<&Value>,
        attempt: u32,
    ) -> Result<Value> {
        debug!(%method, %url, attempt, "HTTP request");

        let path = url.path().to_string();
        let mut request = self
            .inner
            .request(method, url)
            .header(AUTHORIZATION, self.token.as_str())
            .header(CONTENT_TYPE, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), %path, "HTTP error response");
            return Err(RemoteError::from_status(status, &text, attempt));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|source| RemoteError::Decode { path, source })
    }
}
