//! Submit command: run one batch job and render it live.
//!
//! The renderer only consumes orchestrator snapshots; it never drives
//! a transition. Ctrl-C cancels the job in flight.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use bulkdl_core::{
    BatchOrchestrator, BatchReport, ClientConfig, DownloadStatus, HttpTransport, JobSnapshot,
    JobState, LinkItem, Transport,
};

use crate::cli::SubmitArgs;

pub async fn execute(args: SubmitArgs, config: &ClientConfig) -> Result<()> {
    let transport = Arc::new(HttpTransport::new(config.clone())?);

    let items = resolve_items(&transport, &args.target).await?;
    println!("{} link(s) to download", items.len().to_string().bold());

    let orch = BatchOrchestrator::new(Arc::clone(&transport) as Arc<dyn Transport>, config.clone());
    let mut rx = orch.subscribe();

    let bar = ProgressBar::new(items.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("[{bar:40}] {pos}/{len} {msg}")?.progress_chars("=>-"),
    );

    let render_bar = bar.clone();
    let renderer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow().clone();
            render(&render_bar, &snapshot);
            if matches!(snapshot.state, JobState::Idle | JobState::Failed) {
                break;
            }
        }
    });

    let run = orch.run_batch(items);
    tokio::pin!(run);
    let result = loop {
        tokio::select! {
            res = &mut run => break res,
            _ = tokio::signal::ctrl_c() => {
                bar.set_message("cancelling");
                orch.cancel();
            }
        }
    };
    let _ = renderer.await;
    bar.finish_and_clear();

    match result {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            Err(e.into())
        }
    }
}

/// A target ending in `.xlsx` is a sheet to upload; anything else is
/// treated as a single pasted link.
fn is_sheet(target: &str) -> bool {
    target.to_lowercase().ends_with(".xlsx")
}

async fn resolve_items(transport: &HttpTransport, target: &str) -> Result<Vec<LinkItem>> {
    if is_sheet(target) {
        debug!("uploading sheet {}", target);
        let items = transport
            .upload_sheet(Path::new(target))
            .await
            .with_context(|| format!("Failed to upload sheet {target}"))?;
        anyhow::ensure!(!items.is_empty(), "No video links found in {target}");
        Ok(items)
    } else {
        Ok(vec![LinkItem::new(target)?])
    }
}

fn render(bar: &ProgressBar, snapshot: &JobSnapshot) {
    bar.set_position(snapshot.progress_cursor as u64);
    if snapshot.total > 0 {
        bar.set_length(snapshot.total as u64);
    }
    let message = match snapshot.state {
        JobState::Submitting => "submitting".to_string(),
        JobState::StreamingLive | JobState::FallbackPolling => snapshot
            .outcomes
            .iter()
            .find(|o| o.status == DownloadStatus::Downloading)
            .map(|o| o.link.clone())
            .unwrap_or_else(|| snapshot.state.to_string()),
        other => other.to_string(),
    };
    bar.set_message(message);
}

fn print_report(report: &BatchReport) {
    println!("\n{}", "Download Results".bold());
    for outcome in &report.outcomes {
        let line = match outcome.status {
            DownloadStatus::Success => format!("  {} {}", "✓".green(), outcome.link),
            DownloadStatus::Failed => format!(
                "  {} {} ({})",
                "✗".red(),
                outcome.link,
                outcome.error.as_deref().unwrap_or("unknown error").red()
            ),
            other => format!("  {} {} ({})", "-".dimmed(), outcome.link, other),
        };
        println!("{line}");
    }

    let ok = report
        .outcomes
        .iter()
        .filter(|o| o.status == DownloadStatus::Success)
        .count();
    println!(
        "\n{} succeeded, {} failed, {} file(s) on server",
        ok.to_string().green(),
        (report.outcomes.len() - ok).to_string().red(),
        report.view.files.len()
    );
}
