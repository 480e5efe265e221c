//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequest (method, target URL, filtered headers, body)
//!     → forwarder.rs (one hop, transport errors → UpstreamFailure)
//!     → transport.rs (reqwest; streaming response body)
//!     → redirect.rs (GitHub mode: rewrite or follow Location, bounded)
//!     → UpstreamResponse
//! ```
//!
//! # Design Decisions
//! - The transport is a trait so the router can be driven without a network
//! - No retries anywhere: one upstream failure is surfaced immediately
//! - Each hop gets a freshly built request

pub mod forwarder;
pub mod redirect;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use forwarder::forward;
pub use redirect::{Inspection, RedirectResolver};
pub use transport::{
    HttpTransport, OutboundRequest, RedirectMode, Transport, TransportError, UpstreamResponse,
};
