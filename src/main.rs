use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

use tunegate::config::Config;
use tunegate::handler::HandlerRegistry;
use tunegate::server::GatewayServer;

#[derive(Parser)]
#[command(name = "tunegate")]
#[command(about = "HTTP gateway exposing modular API handlers as uniform REST endpoints")]
struct Args {
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    #[arg(short, long)]
    bind: Option<SocketAddr>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("tunegate={}", level))
        .init();

    info!("Starting tunegate gateway");

    // Load configuration
    let mut config = Config::from_file_or_default(&args.config).await?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    // Handler modules are registered by the embedding application; the
    // bare binary still serves the media passthrough and CORS boundary.
    let registry = HandlerRegistry::new();

    let server = GatewayServer::new(config, registry);

    // Setup graceful shutdown
    let shutdown_signal = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        warn!("Received CTRL+C, shutting down gracefully...");
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                tracing::error!("Gateway server error: {}", e);
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received");
        }
    }

    info!("Tunegate shutdown complete");
    Ok(())
}
