//! Redirect resolution for GitHub-routed requests.
//!
//! # States
//! ```text
//! forwarding → inspecting → done          (no Location, or not a 3xx)
//!                         → rewriting     (Location is a GitHub URL)
//!                         → recursing     (any other Location)
//! recursing  → forwarding                 (next hop, bounded)
//! ```
//!
//! # Design Decisions
//! - GitHub locations are rewritten under the proxy prefix so the client
//!   comes back through the proxy
//! - Other locations are followed here, reusing method and headers but not
//!   the body
//! - An explicit loop with a hop counter, not recursion

use axum::http::{header, HeaderValue};
use url::Url;

use crate::error::ProxyError;
use crate::forward::forwarder::forward;
use crate::forward::transport::{OutboundRequest, RedirectMode, Transport, UpstreamResponse};
use crate::observability::metrics;
use crate::routing::classifier::Classifier;
use crate::security::headers::set_host;

/// Outcome of inspecting one upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// Return the response unchanged.
    Done,
    /// Return the response with this `Location`.
    Rewrite(HeaderValue),
    /// Issue another hop against this URL.
    Follow(Url),
}

/// Drives a request through upstream redirects.
pub struct RedirectResolver<'a, T> {
    transport: &'a T,
    classifier: &'a Classifier,
    prefix: &'a str,
    max_hops: usize,
}

impl<'a, T: Transport> RedirectResolver<'a, T> {
    pub fn new(
        transport: &'a T,
        classifier: &'a Classifier,
        prefix: &'a str,
        max_hops: usize,
    ) -> Self {
        Self {
            transport,
            classifier,
            prefix,
            max_hops,
        }
    }

    /// Decide what to do with a response fetched from `current`.
    pub fn inspect(&self, response: &UpstreamResponse, current: &Url) -> Inspection {
        if !response.status.is_redirection() {
            return Inspection::Done;
        }
        let Some(location) = response
            .headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Inspection::Done;
        };

        if self.classifier.is_recognized(location) {
            match HeaderValue::from_str(&format!("{}{}", self.prefix, location)) {
                Ok(value) => Inspection::Rewrite(value),
                Err(_) => Inspection::Done,
            }
        } else {
            match current.join(location) {
                Ok(next) => Inspection::Follow(next),
                Err(_) => Inspection::Done,
            }
        }
    }

    /// Forward `request` and resolve redirects until a final response.
    pub async fn resolve(&self, request: OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
        let method = request.method.clone();
        let mut headers = request.headers.clone();
        let mut current = request.url.clone();
        let mut request = request;
        let mut hops = 0;

        loop {
            let mut response = forward(self.transport, request, RedirectMode::Manual).await?;

            match self.inspect(&response, &current) {
                Inspection::Done => return Ok(response),
                Inspection::Rewrite(location) => {
                    tracing::debug!(location = ?location, "Rewriting redirect under proxy prefix");
                    response.headers.insert(header::LOCATION, location);
                    return Ok(response);
                }
                Inspection::Follow(next) => {
                    if hops >= self.max_hops {
                        tracing::warn!(hops, url = %next, "Redirect limit exceeded");
                        return Err(ProxyError::RedirectLoopExceeded { hops });
                    }
                    hops += 1;
                    metrics::record_redirect_hop();
                    tracing::debug!(hop = hops, from = %current, to = %next, "Following redirect");

                    set_host(&mut headers, &next);
                    request = OutboundRequest {
                        method: method.clone(),
                        url: next.clone(),
                        headers: headers.clone(),
                        body: None,
                    };
                    current = next;
                }
            }
        }
    }
}
