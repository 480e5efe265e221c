//! Request routing and dispatch.
//!
//! # Responsibilities
//! - Pick the addressing mode (`?url=`, `?q=`, path)
//! - Answer preflights and help requests without touching upstream
//! - Enforce the whitelist, classify path targets, dispatch per kind
//! - Convert every failure into a structured response
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Configuration is injected, never global
//! - First classifier match decides the strategy: relay, CDN redirect, or
//!   raw-link rewrite

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::forward::{forward, OutboundRequest, RedirectMode, RedirectResolver, Transport};
use crate::http::request::{
    forwarding_context, is_preflight, is_supported_method, query_param, read_body, request_id,
};
use crate::http::response::{help_response, preflight_response, redirect_response, relay_response};
use crate::observability::metrics;
use crate::routing::classifier::{blob_to_raw, Classifier, TargetDescriptor, TargetKind};
use crate::security::headers::{request_headers, ProxyMode};
use crate::security::whitelist::Whitelist;

/// Entry point for every inbound request.
pub struct ProxyService<T> {
    config: Arc<ProxyConfig>,
    classifier: Classifier,
    whitelist: Whitelist,
    transport: T,
}

impl<T: Transport> ProxyService<T> {
    pub fn new(config: Arc<ProxyConfig>, classifier: Classifier, transport: T) -> Self {
        let whitelist = Whitelist::new(config.proxy.whitelist.clone());
        Self {
            config,
            classifier,
            whitelist,
            transport,
        }
    }

    /// Handle one request. Never fails: errors become responses.
    pub async fn route(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let request_id = request_id(request.headers()).to_string();
        let uri = request.uri().clone();

        let response = match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                if e.status().is_server_error() {
                    tracing::error!(request_id = %request_id, uri = %uri, error = %e, "Request failed");
                } else {
                    tracing::info!(request_id = %request_id, uri = %uri, error = %e, "Request rejected");
                }
                e.into_response()
            }
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), start);
        response
    }

    async fn dispatch(&self, request: Request<Body>) -> Result<Response, ProxyError> {
        let method = request.method().clone();
        if !is_supported_method(&method) {
            return Err(ProxyError::MethodNotAllowed(method));
        }

        // Query-parameter mode, unless the path itself names a GitHub target
        // whose own query happens to carry `url`.
        if let Some(target) = query_param(request.uri(), "url")
            .filter(|_| !self.path_is_github_target(request.uri()))
        {
            if method == Method::OPTIONS {
                return Ok(preflight_response(ProxyMode::Simple));
            }
            let url = parse_target(&target)?;
            self.whitelist.check(&target)?;
            return self.relay(request, url, TargetKind::Unrecognized, ProxyMode::Simple).await;
        }

        if let Some(path) = query_param(request.uri(), "q").filter(|p| !p.is_empty()) {
            let location = self.canonical_location(&request, &path);
            tracing::debug!(location = %location, "Canonicalizing q parameter");
            return Ok(redirect_response(StatusCode::MOVED_PERMANENTLY, &location));
        }

        if is_preflight(&method, request.headers()) {
            return Ok(preflight_response(ProxyMode::GitHub));
        }

        // Path mode.
        let Some(path) = self.target_path(request.uri()) else {
            return Ok(help_response(
                &self.config.proxy.asset_url,
                &self.config.proxy.prefix,
            ));
        };
        self.whitelist.check(&path)?;

        let descriptor = self.classifier.describe(&path);
        tracing::debug!(
            request_id = %request_id(request.headers()),
            url = %descriptor.url,
            kind = %descriptor.kind,
            "Classified target"
        );

        match descriptor.kind {
            TargetKind::BlobRaw if self.config.proxy.jsdelivr => {
                let location = self.classifier.cdn_url(&path).ok_or_else(|| {
                    ProxyError::InternalError(format!("no CDN mapping for {}", path))
                })?;
                Ok(redirect_response(StatusCode::FOUND, &location))
            }
            TargetKind::BlobRaw => {
                let url = parse_target(&blob_to_raw(&descriptor.url))?;
                self.relay(request, url, descriptor.kind, ProxyMode::GitHub).await
            }
            _ => self.relay_descriptor(request, descriptor).await,
        }
    }

    async fn relay_descriptor(
        &self,
        request: Request<Body>,
        descriptor: TargetDescriptor,
    ) -> Result<Response, ProxyError> {
        let url = parse_target(&descriptor.url)?;
        self.relay(request, url, descriptor.kind, ProxyMode::GitHub).await
    }

    /// Forward to `url` and build the client response.
    async fn relay(
        &self,
        request: Request<Body>,
        url: Url,
        kind: TargetKind,
        mode: ProxyMode,
    ) -> Result<Response, ProxyError> {
        let (parts, body) = request.into_parts();
        let body = read_body(
            &parts.method,
            &parts.headers,
            body,
            self.config.security.max_body_size,
        )
        .await?;

        let ctx = forwarding_context(&parts, &self.config.proxy);
        let headers = request_headers(&parts.headers, &url, &ctx, &self.config.proxy.user_agent);

        tracing::info!(
            request_id = %request_id(&parts.headers),
            method = %parts.method,
            url = %url,
            kind = %kind,
            mode = mode.as_str(),
            "Relaying request"
        );

        let outbound = OutboundRequest {
            method: parts.method,
            url,
            headers,
            body,
        };

        let upstream = match mode {
            ProxyMode::Simple => forward(&self.transport, outbound, RedirectMode::Follow).await?,
            ProxyMode::GitHub => {
                RedirectResolver::new(
                    &self.transport,
                    &self.classifier,
                    &self.config.proxy.prefix,
                    self.config.proxy.max_redirects,
                )
                .resolve(outbound)
                .await?
            }
        };

        metrics::record_upstream(kind.as_str(), upstream.status.as_u16());
        Ok(relay_response(upstream, mode))
    }

    fn path_is_github_target(&self, uri: &Uri) -> bool {
        self.target_path(uri)
            .is_some_and(|path| self.classifier.is_recognized(&path))
    }

    /// Target embedded in the path, with the scheme normalized.
    fn target_path(&self, uri: &Uri) -> Option<String> {
        let raw = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let rest = raw.strip_prefix(self.config.proxy.prefix.as_str())?;
        let rest = self.classifier.normalize(rest);
        if rest.is_empty() || rest.starts_with('?') {
            None
        } else {
            Some(rest)
        }
    }

    fn canonical_location(&self, request: &Request<Body>, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
        {
            Some(host) => format!("https://{}{}{}", host, self.config.proxy.prefix, path),
            None => format!("{}{}", self.config.proxy.prefix, path),
        }
    }
}

/// Parse an absolute http(s) target URL.
fn parse_target(target: &str) -> Result<Url, ProxyError> {
    if target.is_empty() {
        return Err(ProxyError::MissingTarget);
    }
    let malformed = |reason: String| ProxyError::MalformedTargetUrl {
        url: target.to_string(),
        reason,
    };

    let url = Url::parse(target).map_err(|e| malformed(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(malformed(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(malformed("missing host".to_string()));
    }
    Ok(url)
}
