use advisor_core::Config;
use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-advisor", version, about = "Weather recommendation service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        /// Address to listen on, e.g. "0.0.0.0:8000". Overrides the config file.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Store the generative backend credentials in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind } => {
                let config = Config::load_with_env()?;
                server::serve(config, bind).await
            }
            Command::Configure => configure(),
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("Gemini API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let model = Text::new("Model:")
        .with_default(&cfg.backend.model)
        .prompt()
        .context("Failed to read model name")?;

    cfg.set_api_key(api_key.trim().to_string());
    cfg.backend.model = model.trim().to_string();
    cfg.backend_api_key()?;
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
