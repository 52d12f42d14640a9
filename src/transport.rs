//! HTTP transport for lead submissions
//!
//! The controller only sees the `LeadTransport` trait; `HttpTransport` is the
//! reqwest-backed implementation used against the real backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::form::SubmissionError;
use crate::observability::CorrelationId;

/// Header carrying the submission's correlation id
pub const CORRELATION_HEADER: &str = "X-Correlation-Id";

/// Response bodies are kept for logs only, truncated to this many bytes
pub const MAX_BODY_BYTES: usize = 2048;

/// One POST of a lead payload
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRequest {
    /// Endpoint path, e.g. `/api/leads`
    pub path: String,
    pub body: Value,
    pub correlation_id: CorrelationId,
}

/// Status and raw body of a backend response
///
/// The body is kept for logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client used by the controller to deliver payloads
///
/// Implementations make exactly one attempt per call; they never retry.
#[async_trait]
pub trait LeadTransport: Send + Sync {
    async fn post(&self, request: &LeadRequest) -> Result<TransportResponse, SubmissionError>;
}

/// reqwest-backed transport with a fixed base URL and timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, SubmissionError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| SubmissionError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, SubmissionError> {
        Self::new(config.base_url.clone(), config.timeout(), &config.user_agent)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn classify(&self, error: reqwest::Error) -> SubmissionError {
        if error.is_timeout() {
            SubmissionError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            SubmissionError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl LeadTransport for HttpTransport {
    async fn post(&self, request: &LeadRequest) -> Result<TransportResponse, SubmissionError> {
        let url = self.url_for(&request.path);
        debug!(url = %url, correlation_id = %request.correlation_id.short(), "POST lead");

        let resp = self
            .http
            .post(&url)
            .header(CORRELATION_HEADER, request.correlation_id.as_str())
            .json(&request.body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status().as_u16();
        let body = read_capped(resp, MAX_BODY_BYTES).await;

        Ok(TransportResponse { status, body })
    }
}

/// Read at most `limit` bytes of the body
///
/// A failed read ends the body early rather than failing the request.
async fn read_capped(mut resp: reqwest::Response, limit: usize) -> String {
    let mut buf = Vec::new();
    while buf.len() < limit {
        match resp.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "Failed to read response body");
                break;
            }
        }
    }
    buf.truncate(limit);
    String::from_utf8_lossy(&buf).into_owned()
}
