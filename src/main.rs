//! CLI entry point for the hecate client.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;

mod client;
mod commands;
mod config;
mod connection;
mod core;
mod facts;
mod logging;
mod palette;
#[cfg(test)]
mod test_support;
mod tui;

use crate::config::{Config, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "hecate",
    author,
    version,
    about = "hecate - modal terminal client for the hecate daemon",
    long_about = "Modal terminal client for the hecate daemon.\n\nJust run 'hecate' to connect; \
it finds the daemon through its socket search or HECATE_SOCKET / HECATE_URL."
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connect over a unix socket at this path
    #[arg(long, conflicts_with = "url")]
    socket: Option<PathBuf>,

    /// Connect to the daemon at this base URL
    #[arg(long)]
    url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable the alternate screen buffer (inline mode)
    #[arg(long = "no-alt-screen")]
    no_alt_screen: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let log_path = logging::init(cli.verbose)?;
    tracing::debug!("logging to {}", log_path.display());

    let config = Config::load(cli.config.as_deref())?;
    let settings = Settings::load()?;
    let transport = connection::resolve(cli.socket, cli.url);
    tracing::info!("connecting via {}", transport);

    tui::run_tui(config, settings, transport, !cli.no_alt_screen).await
}
