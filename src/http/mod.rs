//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, query parameters, forwarding context, body)
//!     → [routing layer classifies and dispatches]
//!     → [forward layer talks to upstream]
//!     → response.rs (filtered headers, CORS, fixed responses)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
