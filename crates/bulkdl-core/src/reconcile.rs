//! Result/history reconciliation.
//!
//! After a job completes, the server is the source of truth: the file
//! list is replaced wholesale and fetched history entries win over
//! locally-known outcomes for the same link.

use std::sync::Arc;

use tracing::warn;

use crate::transport::Transport;
use crate::types::{DownloadOutcome, HistoryEntry, RemoteFile};

/// Authoritative post-job view of the backend.
#[derive(Debug, Clone, Default)]
pub struct ReconciledView {
    /// Flat listing of bytes-on-disk; replace-on-fetch, no merging.
    pub files: Vec<RemoteFile>,
    /// Download history merged with the just-finished job's outcomes.
    pub history: Vec<HistoryEntry>,
}

/// Refreshes authoritative file/history state after a job finishes.
pub struct Reconciler {
    transport: Arc<dyn Transport>,
}

impl Reconciler {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch the file list and history and merge in local outcomes.
    ///
    /// Refresh failures are logged and degrade to an empty listing
    /// rather than failing the job; the outcomes are already final.
    pub async fn refresh(&self, local: &[DownloadOutcome]) -> ReconciledView {
        let (files, history) =
            tokio::join!(self.transport.list_files(), self.transport.fetch_history());

        let files = files.unwrap_or_else(|e| {
            warn!("file listing refresh failed: {}", e);
            Vec::new()
        });
        let history = history.unwrap_or_else(|e| {
            warn!("history refresh failed: {}", e);
            Vec::new()
        });

        ReconciledView { files, history: merge_history(local, history) }
    }
}

/// Merge by link identity: the fetched entry wins (it may carry richer
/// error detail persisted server-side); local outcomes the server has
/// not persisted yet are appended in discovery order.
fn merge_history(local: &[DownloadOutcome], fetched: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut merged = fetched;
    for outcome in local {
        if !merged.iter().any(|entry| entry.link == outcome.link) {
            merged.push(HistoryEntry {
                link: outcome.link.clone(),
                status: outcome.status,
                error: outcome.error.clone(),
            });
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransport;
    use crate::types::DownloadStatus;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_fetched_entry_wins_over_local() {
        let local = vec![DownloadOutcome {
            link: "https://x.com/a".into(),
            status: DownloadStatus::Failed,
            error: Some("network".into()),
        }];
        let fetched = vec![HistoryEntry {
            link: "https://x.com/a".into(),
            status: DownloadStatus::Failed,
            error: Some("HTTP 403: private account".into()),
        }];

        let merged = merge_history(&local, fetched);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].error.as_deref(), Some("HTTP 403: private account"));
    }

    #[test]
    fn test_unpersisted_local_outcome_appended() {
        let local = vec![
            DownloadOutcome { link: "https://x.com/a".into(), status: DownloadStatus::Success, error: None },
            DownloadOutcome { link: "https://x.com/b".into(), status: DownloadStatus::Success, error: None },
        ];
        let fetched = vec![HistoryEntry {
            link: "https://x.com/a".into(),
            status: DownloadStatus::Success,
            error: None,
        }];

        let merged = merge_history(&local, fetched);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].link, "https://x.com/b");
    }

    #[tokio::test]
    async fn test_refresh_degrades_on_fetch_failure() {
        // Default fake returns empty listings; the point is that a
        // refresh never panics or errors out of the completion path.
        let fake = std::sync::Arc::new(FakeTransport::default());
        let reconciler = Reconciler::new(fake.clone() as Arc<dyn Transport>);

        let view = reconciler.refresh(&[]).await;
        assert!(view.files.is_empty());
        assert!(view.history.is_empty());
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fake.history_calls.load(Ordering::SeqCst), 1);
    }
}
