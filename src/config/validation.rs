//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bind addresses parse)
//! - Check that the proxy path is usable as a route and URL prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("rewrite.proxy_path '{0}' must start with '/' and contain no '?' or '#'")]
    ProxyPath(String),

    #[error("rewrite.proxy_path must not be '/', which is reserved for the landing page")]
    ProxyPathIsRoot,

    #[error("timeouts.request_secs ({request}) must exceed fetch.timeout_secs ({fetch})")]
    TimeoutOrdering { request: u64, fetch: u64 },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let counters = [
        ("fetch.timeout_secs", config.fetch.timeout_secs as usize),
        ("fetch.connect_timeout_secs", config.fetch.connect_timeout_secs as usize),
        ("fetch.max_body_bytes", config.fetch.max_body_bytes),
        ("timeouts.request_secs", config.timeouts.request_secs as usize),
    ];
    for (name, value) in counters {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }

    let path = &config.rewrite.proxy_path;
    if !path.starts_with('/') || path.contains(['?', '#']) {
        errors.push(ValidationError::ProxyPath(path.clone()));
    } else if path == "/" {
        errors.push(ValidationError::ProxyPathIsRoot);
    }

    if config.timeouts.request_secs != 0
        && config.timeouts.request_secs <= config.fetch.timeout_secs
    {
        errors.push(ValidationError::TimeoutOrdering {
            request: config.timeouts.request_secs,
            fetch: config.fetch.timeout_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
