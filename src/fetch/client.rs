//! Outbound HTTP client with timeout and redirect bounds.
//!
//! # Responsibilities
//! - Fetch an absolute URL with a fixed user agent and no client headers
//! - Follow redirects up to the configured limit
//! - Enforce a total deadline and a body size cap
//! - Collapse every failure mode into a single `FetchError`

use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

use crate::config::FetchConfig;

/// Reasons an outbound fetch can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("upstream responded with status {0}")]
    UpstreamStatus(u16),

    #[error("response body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::TooManyRedirects(_) => "redirects",
            FetchError::Connect(_) => "connect",
            FetchError::UpstreamStatus(_) => "upstream_status",
            FetchError::BodyTooLarge(_) => "body_too_large",
            FetchError::Transport(_) => "transport",
            FetchError::Client(_) => "client",
        }
    }
}

/// The deliverable part of an origin response.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// Origin status code (always below 500).
    pub status: u16,
    /// URL the content was finally served from, after redirects.
    pub final_url: Url,
    /// Declared media type, empty if the origin sent none.
    pub media_type: String,
    /// Origin `Cache-Control`, if any.
    pub cache_control: Option<String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

/// Fetches remote resources on behalf of clients.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
    max_redirects: usize,
    max_body_bytes: usize,
}

impl ContentFetcher {
    /// Build a fetcher from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
            max_redirects: config.max_redirects,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Fetch `target`, returning the response if its status is below 500.
    pub async fn fetch(&self, target: &Url) -> Result<FetchedContent, FetchError> {
        let mut response = self
            .client
            .get(target.clone())
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(FetchError::UpstreamStatus(status.as_u16()));
        }

        let final_url = response.url().clone();
        let media_type = header_string(response.headers(), CONTENT_TYPE).unwrap_or_default();
        let cache_control = header_string(response.headers(), CACHE_CONTROL);

        if let Some(length) = response.content_length() {
            if length > self.max_body_bytes as u64 {
                return Err(FetchError::BodyTooLarge(self.max_body_bytes));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify_error(e))? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::BodyTooLarge(self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            url = %target,
            final_url = %final_url,
            status = status.as_u16(),
            media_type = %media_type,
            bytes = body.len(),
            "Fetched target"
        );

        Ok(FetchedContent {
            status: status.as_u16(),
            final_url,
            media_type,
            cache_control,
            body,
        })
    }

    fn classify_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else if e.is_redirect() {
            FetchError::TooManyRedirects(self.max_redirects)
        } else if e.is_connect() {
            FetchError::Connect(error_chain(&e))
        } else {
            FetchError::Transport(error_chain(&e))
        }
    }
}

fn header_string(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Render an error with its sources so DNS and socket causes are visible.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
