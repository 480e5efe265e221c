//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Extract routing-relevant information (query parameters, preflight)
//! - Derive the forwarding context (client IP, scheme, host)
//! - Buffer request bodies under the configured limit
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Only methods that carry a body have it read
//! - Content-Length is checked before the body is read

use std::error::Error as StdError;
use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri},
};
use http_body_util::LengthLimitError;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

use crate::config::ForwardingConfig;
use crate::error::ProxyError;
use crate::security::headers::{ForwardingContext, X_FORWARDED_PROTO};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Methods the proxy accepts.
pub const SUPPORTED_METHODS: &[Method] = &[
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::TRACE,
];

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Assigns an ID to requests that arrive without one.
pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), UuidRequestId)
}

/// Copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Request ID for logging, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

pub fn is_supported_method(method: &Method) -> bool {
    SUPPORTED_METHODS.contains(method)
}

/// Methods whose body is forwarded upstream.
pub fn carries_body(method: &Method) -> bool {
    *method == Method::POST
        || *method == Method::PUT
        || *method == Method::PATCH
        || *method == Method::DELETE
}

/// First value of query parameter `name`, percent-decoded.
pub fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Browser CORS preflight: OPTIONS plus an `Access-Control-Request-*` header.
pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
    *method == Method::OPTIONS
        && (headers.contains_key(header::ACCESS_CONTROL_REQUEST_HEADERS)
            || headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD))
}

/// Collect X-Forwarded-* inputs.
///
/// The client IP comes from `client_ip_header` when a trusted front proxy set
/// it, else from the socket peer address. Server-side URIs are origin-form and
/// carry no scheme, so the proto is `http` unless `trust_forwarded_proto` lets
/// an inbound `X-Forwarded-Proto` of `http` or `https` through.
pub fn forwarding_context(parts: &Parts, config: &ForwardingConfig) -> ForwardingContext {
    let client_ip = parts
        .headers
        .get(config.client_ip_header.as_str())
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

    let proto = config
        .trust_forwarded_proto
        .then(|| parts.headers.get(X_FORWARDED_PROTO))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| v == "http" || v == "https")
        .unwrap_or_else(|| "http".to_string());

    ForwardingContext {
        client_ip,
        proto,
        host: parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// Read the inbound body if the method carries one.
pub async fn read_body(
    method: &Method,
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> Result<Option<Bytes>, ProxyError> {
    if !carries_body(method) {
        return Ok(None);
    }

    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(ProxyError::PayloadTooLarge { limit });
    }

    axum::body::to_bytes(body, limit)
        .await
        .map(Some)
        .map_err(|e| {
            if exceeds_limit(&e) {
                ProxyError::PayloadTooLarge { limit }
            } else {
                ProxyError::InternalError(format!("failed to read request body: {}", e))
            }
        })
}

/// True if a body error was caused by the size limit rather than I/O.
fn exceeds_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
