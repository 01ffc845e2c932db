// PawForge Gateway - Main Entry Point
//
// Runs the HTTP gateway that admits, forwards and records pet image
// generation requests.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pawforge::config::Config;
use pawforge::{logging, server};
use std::path::PathBuf;
use tracing::info;

/// PawForge: pet photo stylization gateway
#[derive(Parser, Debug)]
#[command(name = "pawforge")]
#[command(author = "PawForge Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Rate-limited gateway for AI pet image generation", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file (default: XDG config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate and print the effective configuration
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Serve { port }) => {
            let mut config = load_config(args.config.as_ref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            logging::init(&config, args.verbose)?;

            info!("🐾 PawForge Gateway v{} starting...", env!("CARGO_PKG_VERSION"));
            server::serve(config).await?;
        }
        Some(Commands::CheckConfig) => {
            let mut config = load_config(args.config.as_ref())?;
            if config.generator.api_token.is_some() {
                config.generator.api_token = Some("<redacted>".to_string());
            }
            let text = toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("Configuration OK");
            println!("{}", text);
        }
        None => {
            println!("No command specified. Use \"pawforge --help\" for usage.");
        }
    }

    Ok(())
}
