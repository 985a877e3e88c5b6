//! bulkdl-core - Core library for bulkdl
//!
//! Client-side orchestration of server-side bulk video download jobs:
//!
//! - **types**: links, outcomes, jobs, and the progress wire format
//! - **config**: explicit client configuration (base URL, credentials,
//!   retry policy)
//! - **transport**: HTTP/WebSocket adapter behind the [`Transport`]
//!   trait
//! - **channel**: reconnecting live channel with liveness detection
//! - **orchestrator**: the job state machine, from submission to a
//!   terminal state
//! - **reconcile**: post-job refresh of authoritative files/history

pub mod channel;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod reconcile;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{ClientConfig, RetryConfig};
pub use error::{Error, Result};
pub use orchestrator::{BatchOrchestrator, BatchReport, JobSnapshot};
pub use reconcile::{ReconciledView, Reconciler};
pub use transport::{HttpTransport, Transport};
pub use types::{
    BatchJob, DownloadOutcome, DownloadStatus, HistoryEntry, JobId, JobState, LinkItem,
    ProgressEvent, RemoteFile,
};
