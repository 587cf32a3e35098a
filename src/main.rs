mod app;
mod config;
mod conversation;
mod events;
mod transport;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "leadchat")]
#[command(version)]
#[command(about = "Terminal chat client for lead-gen assistant services", long_about = None)]
struct Cli {
    /// Chat service base URL for this run only (not persisted)
    #[arg(long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or persist the chat service endpoint
    Endpoint {
        /// New base URL; omit to print the current one
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent unless RUST_LOG asks otherwise; stderr so the TUI stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    match cli.command {
        Some(Commands::Endpoint { url: Some(url) }) => {
            config.endpoint = url;
            config.save()?;
            println!("Endpoint set to {}", config.endpoint_base());
        }
        Some(Commands::Endpoint { url: None }) => {
            println!("{}", config.endpoint_base());
        }
        None => {
            if let Some(endpoint) = cli.endpoint {
                config.endpoint = endpoint;
            }
            app::run(config).await?;
        }
    }

    Ok(())
}
