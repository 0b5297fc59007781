//! Web server exposing the Crucible sandbox over HTTP.
//!
//! This binary wires configuration, the isolation backend, and the axum
//! boundary together. Submitted code reaches the sandbox through a single
//! execute endpoint; everything around it (accounts, persistence, UI) is the
//! caller's concern.

use anyhow::Result;
use clap::Parser;
use crucible_core::{ConfigLoader, CrucibleConfig, Sandbox};
use crucible_server::{shutdown_signal, CrucibleServer, ServerConfig};
use log::LevelFilter;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Crucible Server - sandboxed code execution over HTTP")]
struct Cli {
    #[clap(long, short, help = "Path to a YAML configuration file; defaults apply when omitted")]
    config: Option<String>,

    #[clap(long, default_value = "127.0.0.1:3001")]
    bind_addr: String,

    #[clap(long, short, default_value = "info")]
    log_level: String,

    #[clap(long, help = "Disable CORS headers")]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let config = match &cli.config {
        Some(path) => {
            log::info!("Loading configuration from file: {}", path);
            ConfigLoader::from_file(path).await?
        }
        None => {
            log::info!("No configuration file given, using defaults");
            CrucibleConfig::default()
        }
    };
    log::info!(
        "Sandbox backend: {:?}, timeout: {}s",
        config.backend,
        config.timeout_secs
    );

    let sandbox = Sandbox::from_config(config)?;

    let bind_socket_addr: SocketAddr = cli
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cli.bind_addr, e))?;

    let server_config = ServerConfig::default()
        .with_bind_addr(bind_socket_addr)
        .with_cors(!cli.no_cors)
        .with_logging(true);

    log::info!("Starting crucible server on {}...", bind_socket_addr);

    let server = CrucibleServer::with_config(Arc::new(sandbox), server_config);

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        log::error!("Server failed: {}", e);
        return Err(e);
    }

    log::info!("crucible server shut down gracefully.");
    Ok(())
}
