//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Define the `Transport` capability the forwarder depends on
//! - Provide the reqwest-backed implementation used in production
//! - Stream upstream bodies back without buffering
//!
//! # Design Decisions
//! - No retries, caching or timeouts beyond the connect timeout
//! - Redirect policy chosen per call: manual for GitHub routing, follow for
//!   the query-parameter proxy

use std::future::Future;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, StatusCode};
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

use crate::config::ProxyConfig;

/// A single upstream request. Built fresh for every hop.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Upstream response with a streaming body.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

/// How the transport treats 3xx responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// Return redirects as-is so `Location` can be inspected.
    Manual,
    /// Let the transport follow redirects.
    Follow,
}

/// Transport-level failure (DNS, connect, TLS, protocol).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Capability to perform one HTTP exchange.
pub trait Transport: Send + Sync + 'static {
    /// Send `request` and resolve once response headers arrive.
    fn fetch(
        &self,
        request: OutboundRequest,
        redirect: RedirectMode,
    ) -> impl Future<Output = Result<UpstreamResponse, TransportError>> + Send;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    manual: reqwest::Client,
    follow: reqwest::Client,
}

impl HttpTransport {
    /// Build clients for both redirect modes.
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let build = |policy: Policy| {
            let mut builder = reqwest::Client::builder()
                .redirect(policy)
                .connect_timeout(Duration::from_secs(config.timeouts.connect_secs));
            if !config.proxy.system_proxy {
                builder = builder.no_proxy();
            }
            builder.build()
        };

        Ok(Self {
            manual: build(Policy::none())?,
            follow: build(Policy::limited(config.proxy.max_redirects))?,
        })
    }

    fn client(&self, redirect: RedirectMode) -> &reqwest::Client {
        match redirect {
            RedirectMode::Manual => &self.manual,
            RedirectMode::Follow => &self.follow,
        }
    }
}

impl Transport for HttpTransport {
    async fn fetch(
        &self,
        request: OutboundRequest,
        redirect: RedirectMode,
    ) -> Result<UpstreamResponse, TransportError> {
        // The client derives Host from the URL on every hop, including the
        // redirects it follows itself. An explicit Host would stick to the
        // first target.
        let mut headers = request.headers;
        headers.remove(header::HOST);

        let mut builder = self
            .client(redirect)
            .request(request.method, request.url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        Ok(UpstreamResponse {
            status,
            headers,
            body: Body::from_stream(response.bytes_stream()),
        })
    }
}
