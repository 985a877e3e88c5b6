//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};

/// Bulk video download CLI
///
/// Submit a spreadsheet of video links or a single pasted link and
/// track the download job live.
#[derive(Parser, Debug)]
#[command(name = "bulkdl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Backend base URL (overrides BULKDL_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Do not send cookies with requests
    #[arg(long, global = true)]
    pub no_credentials: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a batch (an .xlsx sheet with a video_link column) or a
    /// single pasted link, and track it to completion
    Submit(SubmitArgs),

    /// List downloaded files on the server
    Files {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show download history
    History {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Clear the persisted download history
    ClearHistory,

    /// Save one downloaded file locally
    Fetch(FetchArgs),

    /// Print version
    Version,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Path to an .xlsx sheet, or a single video URL
    pub target: String,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// File name as reported by `bulkdl files`
    pub name: String,

    /// Output path (defaults to the file name in the current directory)
    #[arg(short, long)]
    pub output: Option<String>,
}
