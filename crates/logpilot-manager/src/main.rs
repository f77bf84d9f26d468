//! Logpilot - runs one pipeline per configuration file in the watched
//! directories until interrupted

use anyhow::Context;
use clap::Parser;
use logpilot_manager::{Manager, ManagerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Logpilot log collection manager
#[derive(Debug, Parser)]
#[command(name = "logpilot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Manager configuration file (TOML); defaults apply when omitted
    #[arg(short, long, env = "LOGPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of runner configuration files (repeatable)
    #[arg(short, long = "watch", required = true)]
    watch: Vec<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ManagerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ManagerConfig::default(),
    };

    let manager = Manager::new(config)?;
    manager.watch(cli.watch.as_slice()).await?;
    tracing::info!(
        "Started {} runner(s) from {} directories",
        manager.runner_count(),
        manager.watcher_count()
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    tracing::info!("Interrupt received, shutting down");
    manager.stop().await;
    Ok(())
}
