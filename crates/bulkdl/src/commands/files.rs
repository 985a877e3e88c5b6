//! Files command: list downloaded files on the server.

use anyhow::Result;
use colored::Colorize;

use bulkdl_core::{ClientConfig, HttpTransport, Transport};

pub async fn execute(json: bool, config: &ClientConfig) -> Result<()> {
    let transport = HttpTransport::new(config.clone())?;
    let files = transport.list_files().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("No files on the server.");
        return Ok(());
    }

    println!("{}", "Downloaded Files".bold());
    for file in &files {
        println!("  {:>9}  {}", human_size(file.size), file.name);
    }
    println!("\n{} file(s)", files.len());
    Ok(())
}

/// Render a byte count the way a directory listing would.
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
