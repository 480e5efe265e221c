//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, redirect cap bounded)
//! - Check that addresses, URLs and header names parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// Upper bound accepted for `proxy.max_redirects`.
pub const MAX_REDIRECTS_LIMIT: usize = 20;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let proxy = &config.proxy;
    if !proxy.prefix.starts_with('/') || !proxy.prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "proxy.prefix",
            "must start and end with '/'",
        ));
    }

    match Url::parse(&proxy.asset_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::new(
            "proxy.asset_url",
            format!("'{}' is not an absolute http(s) URL", proxy.asset_url),
        )),
    }

    if proxy.max_redirects == 0 || proxy.max_redirects > MAX_REDIRECTS_LIMIT {
        errors.push(ValidationError::new(
            "proxy.max_redirects",
            format!("must be between 1 and {}", MAX_REDIRECTS_LIMIT),
        ));
    }

    if proxy.whitelist.iter().any(|entry| entry.is_empty()) {
        errors.push(ValidationError::new(
            "proxy.whitelist",
            "entries must not be empty",
        ));
    }

    if HeaderName::from_bytes(proxy.client_ip_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "proxy.client_ip_header",
            format!("'{}' is not a valid header name", proxy.client_ip_header),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
