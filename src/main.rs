use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use ddns_route53::{api, Config, Route53Provider, UpdateHandler};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ddns-route53")]
#[command(about = "A token-authenticated DDNS update endpoint backed by Route 53")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration first (before logger init)
    let config = Config::load(args.config.as_deref())?;

    // Initialize logger with config log level (env var takes precedence)
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.server.log_level)
    ).init();

    match &args.config {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => info!("No configuration file given, using defaults and environment"),
    }
    if !config.ddns.is_complete() {
        warn!("Update token or hosted zone id missing; every update will be refused");
    }

    let provider = Route53Provider::from_env().await;
    let handler = UpdateHandler::new(config.ddns.clone(), Arc::new(provider))
        .with_timeout(config.server.request_timeout());

    // Create router
    let app = api::create_router(handler);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);
    info!("DDNS endpoint: GET /update?hostname={{host}}&token={{token}}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("goodbye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("quitting from signal");
}
