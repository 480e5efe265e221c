//! Single-hop forwarding.

use crate::error::ProxyError;
use crate::forward::transport::{OutboundRequest, RedirectMode, Transport, UpstreamResponse};

/// Issue one upstream request. Transport failures become `UpstreamFailure`.
pub async fn forward<T: Transport>(
    transport: &T,
    request: OutboundRequest,
    redirect: RedirectMode,
) -> Result<UpstreamResponse, ProxyError> {
    let url = request.url.to_string();

    tracing::debug!(
        method = %request.method,
        url = %url,
        redirect = ?redirect,
        "Forwarding request"
    );

    match transport.fetch(request, redirect).await {
        Ok(response) => {
            tracing::debug!(url = %url, status = %response.status, "Upstream responded");
            Ok(response)
        }
        Err(source) => {
            tracing::warn!(url = %url, error = %source, "Upstream request failed");
            Err(ProxyError::UpstreamFailure { url, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::mock::MockTransport;
    use axum::http::{HeaderMap, Method, StatusCode};
    use url::Url;

    fn request() -> OutboundRequest {
        OutboundRequest {
            method: Method::PUT,
            url: Url::parse("https://example.com/upload").unwrap(),
            headers: HeaderMap::new(),
            body: Some("payload".into()),
        }
    }

    #[tokio::test]
    async fn passes_request_through() {
        let transport = MockTransport::new().respond(201, &[], "created");

        let response = forward(&transport, request(), RedirectMode::Follow).await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED);

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::PUT);
        assert_eq!(sent[0].redirect, RedirectMode::Follow);
        assert_eq!(sent[0].body.as_deref(), Some(&b"payload"[..]));
    }

    #[tokio::test]
    async fn transport_error_is_upstream_failure() {
        let transport = MockTransport::new().fail("connection refused");

        let err = forward(&transport, request(), RedirectMode::Manual).await.unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamFailure { .. }));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
