//! Error types for bulkdl-core.

use thiserror::Error;

/// Result type alias using bulkdl-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for batch download operations
#[derive(Error, Debug)]
pub enum Error {
    // Submission errors (fatal to the job, never retried here)
    #[error("Submission rejected: {0}")]
    Submission(String),

    // Live channel errors (transient, absorbed by the reconnect policy)
    #[error("Live channel error: {0}")]
    Channel(String),

    // The server pushed an explicit error event; message surfaced verbatim
    #[error("Server reported failure: {0}")]
    ServerReported(String),

    // No response at all. The client cannot tell connectivity loss
    // from a CORS misconfiguration, so the hint covers both.
    #[error("No response from server; check connectivity and server CORS settings")]
    NetworkAmbiguous(#[source] reqwest::Error),

    // Orchestrator lifecycle errors
    #[error("A batch job is already in flight")]
    JobInFlight,

    #[error("Job cancelled")]
    Cancelled,

    // Input validation errors
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Unsupported sheet (expected .xlsx): {0}")]
    UnsupportedSheet(String),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Wire format errors
    #[error("Malformed frame: {0}")]
    Frame(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a channel error from any displayable cause
    pub fn channel(cause: impl std::fmt::Display) -> Self {
        Self::Channel(cause.to_string())
    }
}
