//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → whitelist.rs (reject targets outside the configured list)
//!     → headers.rs (allow-list request headers, add X-Forwarded-*)
//!     → forward upstream
//! Upstream response:
//!     → headers.rs (strip cookies/vendor/fingerprint headers, add CORS)
//! ```
//!
//! # Design Decisions
//! - Fail closed: headers not on the allow-list never leave the proxy
//! - No trust in client-supplied forwarding headers

pub mod headers;
pub mod whitelist;
