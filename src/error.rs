//! Request-level errors and their HTTP mapping.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::forward::TransportError;

/// Everything that can stop a request from being relayed.
///
/// All variants are converted into a JSON response at the router boundary;
/// none escape to the server as unhandled faults.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no target URL in request")]
    MissingTarget,

    #[error("invalid target URL '{url}': {reason}")]
    MalformedTargetUrl { url: String, reason: String },

    #[error("target '{0}' is not in the whitelist")]
    WhitelistRejected(String),

    #[error("upstream request to {url} failed: {source}")]
    UpstreamFailure {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("redirect limit exceeded after {hops} hops")]
    RedirectLoopExceeded { hops: usize },

    #[error("method {0} is not supported")]
    MethodNotAllowed(Method),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("internal error: {0}")]
    InternalError(String),
}

impl ProxyError {
    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget | ProxyError::MalformedTargetUrl { .. } => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::WhitelistRejected(_) => StatusCode::FORBIDDEN,
            ProxyError::UpstreamFailure { .. } | ProxyError::RedirectLoopExceeded { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error name used in the JSON body.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MissingTarget => "MissingTarget",
            ProxyError::MalformedTargetUrl { .. } => "MalformedTargetUrl",
            ProxyError::WhitelistRejected(_) => "WhitelistRejected",
            ProxyError::UpstreamFailure { .. } => "UpstreamFailure",
            ProxyError::RedirectLoopExceeded { .. } => "RedirectLoopExceeded",
            ProxyError::MethodNotAllowed(_) => "MethodNotAllowed",
            ProxyError::PayloadTooLarge { .. } => "PayloadTooLarge",
            ProxyError::InternalError(_) => "InternalError",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        let mut response = (self.status(), body).into_response();
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        response
    }
}
