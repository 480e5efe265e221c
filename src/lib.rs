//! GitHub edge proxy library.
//!
//! Relays GitHub release, archive, raw and gist downloads (path mode) and
//! arbitrary URLs (`?url=` mode) with CORS exposure and header hygiene.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
