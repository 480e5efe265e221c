//! GitHub edge proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server ──▶ routing::router ──┬─▶ preflight / help / ?q= redirect
//!                                                 │
//!                                                 ├─▶ routing::classifier
//!                                                 │      ├─ blob + CDN ──▶ 302 jsDelivr
//!                                                 │      └─ relay
//!                                                 ▼
//!                                        security::headers (request allow-list)
//!                                                 │
//!                                                 ▼
//!                                forward::forwarder ──▶ forward::transport ──▶ Upstream
//!                                                 │
//!                                forward::redirect (rewrite or follow Location)
//!                                                 │
//!   Client ◀── http::response ◀── security::headers (strip, CORS)
//! ```

use std::path::PathBuf;

use clap::Parser;

use gh_edge_proxy::lifecycle::startup;

#[derive(Parser)]
#[command(name = "gh-edge-proxy", version)]
#[command(about = "Reverse proxy for GitHub downloads with CORS support", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration file.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = startup::load(cli.config.as_deref(), cli.bind)?;
    startup::run(config).await?;
    Ok(())
}
