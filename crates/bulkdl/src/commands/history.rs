//! History commands: show and clear the persisted download history.

use anyhow::Result;
use colored::Colorize;

use bulkdl_core::{ClientConfig, DownloadStatus, HttpTransport, Transport};

pub async fn execute(json: bool, config: &ClientConfig) -> Result<()> {
    let transport = HttpTransport::new(config.clone())?;
    let history = transport.fetch_history().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No download history.");
        return Ok(());
    }

    println!("{}", "Download History".bold());
    for entry in &history {
        match entry.status {
            DownloadStatus::Success => println!("  {} {}", "✓".green(), entry.link),
            DownloadStatus::Failed => println!(
                "  {} {} ({})",
                "✗".red(),
                entry.link,
                entry.error.as_deref().unwrap_or("unknown error")
            ),
            other => println!("  {} {} ({})", "-".dimmed(), entry.link, other),
        }
    }
    Ok(())
}

pub async fn clear(config: &ClientConfig) -> Result<()> {
    let transport = HttpTransport::new(config.clone())?;
    transport.clear_history().await?;
    println!("{}", "History cleared.".green());
    Ok(())
}
