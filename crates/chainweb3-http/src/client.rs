//! HTTP JSON-RPC transport backed by `reqwest`.
//!
//! The request manager hands over a serialized message (single object or
//! batch array); the transport POSTs it unchanged and returns the raw reply
//! body. Transient failures are retried with exponential backoff, or after
//! the node's `Retry-After` when it sends one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, RETRY_AFTER};

use chainweb3_core::error::TransportError;
use chainweb3_core::transport::RpcTransport;

use crate::retry::{RetryConfig, RetryPolicy};

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    /// Extra headers sent with every request, e.g. an API key.
    pub headers: Vec<(String, String)>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
            headers: Vec::new(),
        }
    }
}

/// HTTP transport with retry.
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpTransportConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Other(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::Other(format!("invalid value for header {}: {e}", name.as_str()))
            })?;
            headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            retry: RetryPolicy::new(config.retry),
            request_timeout: config.request_timeout,
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(url, HttpTransportConfig::default())
    }

    async fn send_once(&self, payload: &[u8]) -> Result<Vec<u8>, Failure> {
        let resp = self
            .http
            .post(&self.url)
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| Failure::from(self.map_reqwest(e)))?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = retry_after(resp.headers());
            let body = resp.text().await.unwrap_or_default();
            return Err(Failure {
                error: TransportError::Status {
                    status: status.as_u16(),
                    body,
                },
                retry_after,
            });
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Failure::from(self.map_reqwest(e)))
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

/// A failed attempt plus the node's `Retry-After` hint, if any.
struct Failure {
    error: TransportError,
    retry_after: Option<Duration>,
}

impl From<TransportError> for Failure {
    fn from(error: TransportError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send_raw(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.send_once(&payload).await {
                Ok(body) => return Ok(body),
                Err(Failure { error: e, retry_after }) if e.is_retryable() => match self
                    .retry
                    .next_delay(attempt, retry_after)
                {
                    Some(delay) => {
                        tracing::warn!(
                            attempt,
                            delay_ms = delay.as_millis(),
                            error = %e,
                            url = %self.url,
                            "retrying request"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!(
                            attempt,
                            error = %e,
                            url = %self.url,
                            "max retries exceeded"
                        );
                        return Err(e);
                    }
                },
                Err(failure) => return Err(failure.error),
            }
        }
    }

    fn url(&self) -> &str {
        &self.url
    }
}
