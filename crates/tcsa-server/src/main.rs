//! TCSA Scoring Server CLI
//!
//! Starts the HTTP server that scores sustainability reports.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tcsa_server::{config::ServerConfig, start_server};
use tracing_subscriber::EnvFilter;

/// TCSA Scoring Server - Score sustainability reports against the TCSA rubric.
#[derive(Debug, Parser)]
#[command(name = "tcsa-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TCSA_CONFIG")]
    config: PathBuf,

    /// Override the configured bind address (e.g. 0.0.0.0:8000)
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ServerConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if let Some(addr) = cli.bind {
        config.bind_address = addr.ip().to_string();
        config.bind_port = addr.port();
    }

    start_server(config).await?;

    Ok(())
}
