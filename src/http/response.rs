//! Response construction and error mapping.
//!
//! # Responsibilities
//! - Serve rewritten HTML as `text/html; charset=utf-8`
//! - Pass opaque bodies through with their origin status, media type and
//!   cache policy
//! - Map request and fetch failures to plain-text 400/502 responses
//!
//! # Design Decisions
//! - Opaque bodies are never inspected or re-encoded
//! - Fetch failures surface the underlying message to the caller

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::fetch::{FetchError, FetchedContent};
use crate::rewrite::Document;

/// Errors reported to the requesting client.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing required query parameter: url")]
    MissingUrl,

    #[error("Invalid url parameter '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme '{0}': only http and https can be proxied")]
    UnsupportedScheme(String),

    #[error("Error fetching URL: {0}")]
    Fetch(#[from] FetchError),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl
            | ProxyError::InvalidUrl { .. }
            | ProxyError::UnsupportedScheme(_) => StatusCode::BAD_REQUEST,
            ProxyError::Fetch(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// 200 response carrying a rewritten document.
pub fn html_response(document: Document) -> Response {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        document.into_bytes(),
    )
        .into_response()
}

/// Byte-for-byte passthrough of a non-HTML response.
pub fn passthrough_response(content: FetchedContent) -> Response {
    let status = StatusCode::from_u16(content.status).unwrap_or(StatusCode::OK);
    let mut response = (status, Body::from(content.body)).into_response();

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&content.media_type) {
        if !content.media_type.is_empty() {
            headers.insert(header::CONTENT_TYPE, value);
        }
    }
    if let Some(value) = content
        .cache_control
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(header::CACHE_CONTROL, value);
    }

    response
}
