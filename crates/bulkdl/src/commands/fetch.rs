//! Fetch command: save one downloaded file locally.

use anyhow::{Context, Result};
use colored::Colorize;

use bulkdl_core::{ClientConfig, HttpTransport};

use crate::cli::FetchArgs;

pub async fn execute(args: FetchArgs, config: &ClientConfig) -> Result<()> {
    let transport = HttpTransport::new(config.clone())?;

    let bytes = transport
        .fetch_file(&args.name)
        .await
        .with_context(|| format!("Failed to fetch {}", args.name))?;

    let output = args.output.unwrap_or_else(|| args.name.clone());
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {output}"))?;

    println!("{} {} ({} bytes)", "Saved".green(), output, bytes.len());
    Ok(())
}
