//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn upstream responses into client responses (filtered headers, CORS)
//! - Fixed responses: preflight, redirects, help text
//!
//! # Design Decisions
//! - Upstream bodies are streamed, never buffered
//! - Every response the proxy creates itself carries the wildcard CORS origin

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::forward::UpstreamResponse;
use crate::security::headers::{preflight_headers, response_headers, ProxyMode};

/// Client response for an upstream response.
pub fn relay_response(upstream: UpstreamResponse, mode: ProxyMode) -> Response {
    let mut response = Response::new(upstream.body);
    *response.status_mut() = upstream.status;
    *response.headers_mut() = response_headers(upstream.headers, mode);
    response
}

/// 204 answer to a CORS preflight.
pub fn preflight_response(mode: ProxyMode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    *response.headers_mut() = preflight_headers(mode);
    response
}

/// Redirect the client to `location`.
pub fn redirect_response(status: StatusCode, location: &str) -> Response {
    let Ok(value) = HeaderValue::from_str(location) else {
        return crate::error::ProxyError::MalformedTargetUrl {
            url: location.to_string(),
            reason: "not a valid Location header value".to_string(),
        }
        .into_response();
    };

    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(header::LOCATION, value);
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

/// Usage text for requests that name no target.
pub fn help_text(asset_url: &str, prefix: &str) -> String {
    format!(
        "GitHub edge proxy\n\
         \n\
         No target given. Supported forms:\n\
         \n\
         \x20 {prefix}https://github.com/<user>/<repo>/releases/download/<tag>/<file>\n\
         \x20 {prefix}https://github.com/<user>/<repo>/archive/<ref>.zip\n\
         \x20 {prefix}https://github.com/<user>/<repo>/blob/<ref>/<file>\n\
         \x20 {prefix}https://raw.githubusercontent.com/<user>/<repo>/<ref>/<file>\n\
         \x20 {prefix}https://gist.githubusercontent.com/<user>/<id>/raw/<file>\n\
         \x20 git clone https://<proxy-host>{prefix}https://github.com/<user>/<repo>\n\
         \x20 /?url=<absolute-url>\n\
         \n\
         Documentation: {asset_url}\n"
    )
}

/// 400 response carrying the usage text.
pub fn help_response(asset_url: &str, prefix: &str) -> Response {
    let mut response = (StatusCode::BAD_REQUEST, help_text(asset_url, prefix)).into_response();
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[tokio::test]
    async fn relay_streams_body_and_filters_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::SERVER, "GitHub.com".parse().unwrap());
        headers.insert(header::CONTENT_TYPE, "application/zip".parse().unwrap());
        let upstream = UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: Body::from("zipbytes"),
        };

        let response = relay_response(upstream, ProxyMode::GitHub);
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::SERVER));
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"zipbytes");
    }

    #[test]
    fn redirect_sets_location() {
        let response = redirect_response(StatusCode::FOUND, "https://cdn.jsdelivr.net/gh/u/r@main/f");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://cdn.jsdelivr.net/gh/u/r@main/f"
        );
    }

    #[test]
    fn help_mentions_asset_url() {
        let text = help_text("https://example.com/help", "/gh/");
        assert!(text.contains("https://example.com/help"));
        assert!(text.contains("/gh/https://github.com/"));
    }
}
