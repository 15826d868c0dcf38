//! Request handlers.
//!
//! `proxy_handler` drives one request end to end:
//! validate `url` → fetch → classify → rewrite or pass through.

use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use url::Url;

use crate::fetch::{classify, decode_html, ContentClass};
use crate::http::request::RequestIdExt;
use crate::http::response::{html_response, passthrough_response, ProxyError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::rewrite::{BaseOrigin, Document};

/// Query string of the proxy endpoint.
#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// Proxy a single target URL.
pub async fn proxy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ProxyQuery>,
) -> Response {
    let start_time = Instant::now();
    let request_id = headers.request_id();

    let (response, kind) = match serve_target(&state, request_id, query).await {
        Ok(served) => served,
        Err(e) => {
            match &e {
                ProxyError::Fetch(fetch_error) => {
                    tracing::warn!(request_id = %request_id, error = %fetch_error, "Fetch failed");
                    metrics::record_fetch_failure(fetch_error.kind());
                }
                other => {
                    tracing::debug!(request_id = %request_id, error = %other, "Rejected proxy request");
                }
            }
            (e.into_response(), "error")
        }
    };

    metrics::record_request(kind, response.status().as_u16(), start_time);
    response
}

async fn serve_target(
    state: &AppState,
    request_id: &str,
    query: ProxyQuery,
) -> Result<(Response, &'static str), ProxyError> {
    let raw = query
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or(ProxyError::MissingUrl)?;
    let target = parse_target(&raw)?;

    tracing::debug!(request_id = %request_id, url = %target, "Proxying request");

    let content = state.fetcher.fetch(&target).await?;

    match classify(&content.media_type) {
        ContentClass::Html => {
            let base = BaseOrigin::new(content.final_url);
            let mut document =
                Document::from_bytes(decode_html(content.body, &content.media_type));
            let bytes_in = document.len();
            state.engine.rewrite(&mut document, &base);

            tracing::info!(
                request_id = %request_id,
                url = %base,
                upstream_status = content.status,
                bytes_in,
                bytes_out = document.len(),
                "Served rewritten document"
            );
            metrics::record_rewrite(document.len());
            Ok((html_response(document), "html"))
        }
        ContentClass::Opaque => {
            tracing::info!(
                request_id = %request_id,
                url = %content.final_url,
                upstream_status = content.status,
                media_type = %content.media_type,
                bytes = content.body.len(),
                "Passed through resource"
            );
            Ok((passthrough_response(content), "passthrough"))
        }
    }
}

/// Parse the `url` parameter into an absolute http(s) URL.
pub fn parse_target(raw: &str) -> Result<Url, ProxyError> {
    let target = Url::parse(raw.trim()).map_err(|source| ProxyError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    match target.scheme() {
        "http" | "https" => Ok(target),
        other => Err(ProxyError::UnsupportedScheme(other.to_string())),
    }
}

/// Landing page with a form that submits to the proxy endpoint.
pub async fn landing_handler(State(state): State<AppState>) -> Html<String> {
    Html(landing_page(state.engine.resolver().proxy_path()))
}

/// Liveness probe.
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

fn landing_page(proxy_path: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>rewrite-proxy</title></head>
<body>
<h1>rewrite-proxy</h1>
<form method="get" action="{proxy_path}">
<input type="url" name="url" placeholder="https://example.com/" size="60" required>
<button type="submit">Go</button>
</form>
</body>
</html>
"#
    )
}
