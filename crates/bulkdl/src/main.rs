//! bulkdl - Bulk video download CLI
//!
//! Submits a spreadsheet of video links (or a single pasted link) to
//! the download backend and tracks the job live until completion.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("bulkdl=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration (defaults + env), then apply CLI overrides
    let mut config = bulkdl_core::ClientConfig::load();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if cli.no_credentials {
        config.with_credentials = false;
    }

    // Execute command
    match cli.command {
        Commands::Submit(args) => commands::submit::execute(args, &config).await,
        Commands::Files { json } => commands::files::execute(json, &config).await,
        Commands::History { json } => commands::history::execute(json, &config).await,
        Commands::ClearHistory => commands::history::clear(&config).await,
        Commands::Fetch(args) => commands::fetch::execute(args, &config).await,
        Commands::Version => {
            println!("bulkdl {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
