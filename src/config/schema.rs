//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Forwarding behaviour: prefix, CDN toggle, whitelist.
    pub proxy: ForwardingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Path prefix the proxy is mounted under. Must start and end with `/`.
    pub prefix: String,

    /// Help page reference shown to clients that send no target.
    pub asset_url: String,

    /// Redirect GitHub blob links to the jsDelivr CDN instead of relaying them.
    pub jsdelivr: bool,

    /// Substrings a target must contain. Empty allows everything.
    pub whitelist: Vec<String>,

    /// Maximum number of upstream redirects followed for a single request.
    pub max_redirects: usize,

    /// Header carrying the client address set by a trusted front proxy.
    pub client_ip_header: String,

    /// Take `X-Forwarded-Proto` from a trusted front proxy instead of
    /// reporting `http`.
    pub trust_forwarded_proto: bool,

    /// User-Agent sent upstream when the client did not provide one.
    pub user_agent: String,

    /// Route upstream traffic through the proxy named in HTTP(S)_PROXY.
    pub system_proxy: bool,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            prefix: "/".to_string(),
            asset_url: "https://hunshcn.github.io/gh-proxy/".to_string(),
            jsdelivr: false,
            whitelist: Vec::new(),
            max_redirects: 5,
            client_ip_header: "x-real-ip".to_string(),
            trust_forwarded_proto: false,
            user_agent: concat!("gh-edge-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
            system_proxy: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed until response headers are produced, in seconds.
    /// Streaming bodies are not bounded by this.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [proxy]
            jsdelivr = true
            whitelist = ["/alice/"]
            "#,
        )
        .unwrap();

        assert!(config.proxy.jsdelivr);
        assert_eq!(config.proxy.whitelist, vec!["/alice/".to_string()]);
        assert_eq!(config.proxy.prefix, "/");
        assert_eq!(config.proxy.max_redirects, 5);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }
}
