//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener with peer address info
//! - Serve until the shutdown coordinator fires

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::forward::{HttpTransport, Transport};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown;
use crate::lifecycle::StartupError;
use crate::routing::{Classifier, ProxyService};

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a server that forwards over the network.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, transport)
    }

    /// Create a server with a custom transport.
    pub fn with_transport<T: Transport>(config: ProxyConfig, transport: T) -> Result<Self, StartupError> {
        let config = Arc::new(config);
        let classifier = Classifier::new()?;
        let service = Arc::new(ProxyService::new(config.clone(), classifier, transport));
        let router = Self::build_router(&config, service);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<T: Transport>(config: &ProxyConfig, service: Arc<ProxyService<T>>) -> Router {
        Router::new()
            .route("/", any(proxy_handler::<T>))
            .route("/{*path}", any(proxy_handler::<T>))
            .with_state(service)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.proxy.prefix,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method, every path.
async fn proxy_handler<T: Transport>(
    State(service): State<Arc<ProxyService<T>>>,
    request: Request<Body>,
) -> Response {
    service.route(request).await
}
