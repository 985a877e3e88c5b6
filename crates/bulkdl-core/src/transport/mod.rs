//! Transport adapter for the download backend.
//!
//! The orchestrator talks to the server exclusively through the
//! [`Transport`] trait: register a batch, stream progress, and fall
//! back to synchronous result fetching when streaming is unavailable.
//! The adapter deserializes and forwards; it never interprets event
//! content.

mod http;
mod ws;

pub use http::HttpTransport;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::error::Result;
use crate::types::{DownloadOutcome, HistoryEntry, JobId, LinkItem, ProgressEvent, RemoteFile};

/// Lazy, unbounded sequence of progress events for one job.
pub type ProgressStream = Pin<Box<dyn Stream<Item = Result<ProgressEvent>> + Send>>;

/// Protocol-agnostic view of the download backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Register a batch job. Fails with a submission error when the
    /// registration call errors (network, 4xx, 5xx).
    async fn submit_batch(&self, items: &[LinkItem]) -> Result<JobId>;

    /// Open the live progress channel for a registered job.
    async fn open_progress_channel(&self, job: &JobId) -> Result<ProgressStream>;

    /// Synchronous result fetch, used only in fallback mode. Takes the
    /// submitted items so the one-link case can route to the
    /// single-item endpoint.
    async fn fetch_batch_result(
        &self,
        job: &JobId,
        items: &[LinkItem],
    ) -> Result<Vec<DownloadOutcome>>;

    /// Authoritative listing of bytes-on-disk.
    async fn list_files(&self) -> Result<Vec<RemoteFile>>;

    /// Authoritative download history, fetched wholesale.
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>>;

    /// Clear the persisted history.
    async fn clear_history(&self) -> Result<()>;
}
