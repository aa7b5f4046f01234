//! Starhop server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use starhop_core::DistanceTable;
use starhop_server::{RoomManager, ServerConfig, ServerRunner};

#[derive(Parser)]
#[command(name = "starhop-server")]
#[command(about = "Multiplayer star board game server", version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config file
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    if cli.json {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    let mut config = ServerConfig::load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }

    let distances = Arc::new(DistanceTable::build());
    let manager = RoomManager::new(config.clone(), distances);
    let runner = ServerRunner::bind(config.bind_address, manager.clone())
        .await
        .context("Failed to start listener")?;
    tracing::info!(address = %runner.local_addr()?, "listening");

    tokio::select! {
        result = runner.run() => result.context("Listener stopped")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(rooms = manager.room_count().await, "shutting down");
        }
    }
    Ok(())
}
