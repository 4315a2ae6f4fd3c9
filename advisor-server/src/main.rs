//! Binary crate for the `weather-advisor` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Wiring the core components into the HTTP surface

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod routes;
mod server;

const DEFAULT_LOG_FILTER: &str = "info,advisor_core=debug,advisor_server=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
