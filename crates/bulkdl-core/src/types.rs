//! Shared types for bulkdl-core.
//!
//! Data model for one batch download job: the submitted links, the
//! per-link outcomes discovered while the job runs, and the tagged
//! progress events pushed over the live channel.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Link / Outcome Types
// ─────────────────────────────────────────────────────────────────────────────

/// A single video URL submitted for download. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkItem {
    url: String,
}

impl LinkItem {
    /// Validate and wrap a video link. Rejects empty and non-URL input.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidLink("empty link".into()));
        }
        url::Url::parse(trimmed).map_err(|e| Error::InvalidLink(format!("{trimmed}: {e}")))?;
        Ok(Self { url: trimmed.to_string() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Lifecycle of one link inside a job. Only moves forward:
/// `pending → downloading → success | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Success,
    Failed,
}

impl DownloadStatus {
    /// Terminal statuses count toward the progress cursor.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// How far along the forward-only lifecycle this status is.
    /// Both terminal statuses share a rank so neither can replace
    /// the other outside an authoritative merge.
    pub(crate) fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Downloading => 1,
            Self::Success | Self::Failed => 2,
        }
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of attempting one link. `error` is present iff `status` is failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub link: String,
    pub status: DownloadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub fn pending(link: impl Into<String>) -> Self {
        Self { link: link.into(), status: DownloadStatus::Pending, error: None }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Job Types
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque job handle assigned by the server on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Orchestrator state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Submitting,
    StreamingLive,
    FallbackPolling,
    Completing,
    Failed,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::StreamingLive => "streaming-live",
            Self::FallbackPolling => "fallback-polling",
            Self::Completing => "completing",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One batch download job, exclusively owned by the orchestrator for
/// its lifetime. Outcomes are keyed by link, insertion order is
/// discovery order, and the progress cursor never decreases.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub job_id: JobId,
    pub items: Vec<LinkItem>,
    outcomes: Vec<DownloadOutcome>,
    progress_cursor: usize,
}

impl BatchJob {
    /// Create a job with every submitted item seeded at `pending`.
    pub fn new(job_id: JobId, items: Vec<LinkItem>) -> Self {
        let outcomes = items.iter().map(|i| DownloadOutcome::pending(i.url())).collect();
        Self { job_id, items, outcomes, progress_cursor: 0 }
    }

    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    /// Count of items with a terminal outcome.
    pub fn progress_cursor(&self) -> usize {
        self.progress_cursor
    }

    pub fn total(&self) -> usize {
        self.items.len().max(self.outcomes.len())
    }

    /// Upsert the outcome for one link. Status only moves forward; an
    /// event less advanced than the stored status is ignored, which
    /// guards against out-of-order and replayed delivery. Returns
    /// whether anything changed.
    pub fn apply_item_progress(
        &mut self,
        link: &str,
        status: DownloadStatus,
        error: Option<String>,
    ) -> bool {
        let changed = match self.outcomes.iter_mut().find(|o| o.link == link) {
            Some(existing) => {
                if status.rank() <= existing.status.rank() {
                    false
                } else {
                    existing.status = status;
                    existing.error = error;
                    true
                }
            }
            None => {
                // A link the server knows about but we did not submit;
                // track it at its discovery position.
                self.outcomes.push(DownloadOutcome { link: link.to_string(), status, error });
                true
            }
        };
        if changed {
            self.recompute_cursor();
        }
        changed
    }

    /// Merge a terminal result set. Server results are authoritative
    /// and overwrite whatever was reported incrementally.
    pub fn merge_complete(&mut self, results: Vec<DownloadOutcome>) {
        for result in results {
            match self.outcomes.iter_mut().find(|o| o.link == result.link) {
                Some(existing) => *existing = result,
                None => self.outcomes.push(result),
            }
        }
        self.recompute_cursor();
    }

    /// Mark the first still-pending item as downloading. Used only for
    /// simulated progress while a fallback fetch is in flight; never
    /// produces a terminal status, so the forward-only guard keeps it
    /// from shadowing a real outcome. Returns false once nothing is
    /// left to advance.
    pub fn simulate_tick(&mut self) -> bool {
        match self.outcomes.iter_mut().find(|o| o.status == DownloadStatus::Pending) {
            Some(outcome) => {
                outcome.status = DownloadStatus::Downloading;
                true
            }
            None => false,
        }
    }

    fn recompute_cursor(&mut self) {
        let terminal = self.outcomes.iter().filter(|o| o.status.is_terminal()).count();
        debug_assert!(terminal >= self.progress_cursor, "progress cursor regressed");
        self.progress_cursor = terminal;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// A progress frame pushed by the server over the live channel.
///
/// JSON frames are tagged: `heartbeat | progress | complete | error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// Liveness signal only; carries no job data.
    Heartbeat,
    /// Status update for one link.
    #[serde(rename = "progress")]
    Item {
        current: u64,
        total: u64,
        link: String,
        status: DownloadStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// The job finished; `results` is the authoritative outcome set.
    Complete { results: Vec<DownloadOutcome> },
    /// The server gave up on the whole job.
    Error { message: String },
}

/// A persisted outcome fetched from the history service. Read-only on
/// this side; fetched wholesale and merged by link identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub link: String,
    pub status: DownloadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One downloaded file as reported by the file listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub name: String,
    pub size: u64,
}
