//! Job orchestrator.
//!
//! Drives exactly one batch job at a time from submission to a
//! terminal state:
//!
//! ```text
//! Idle → Submitting → StreamingLive → (FallbackPolling) → Completing → Idle
//!                └────────── Failed (from any non-idle state) ──────────┘
//! ```
//!
//! All work is event-driven on one logical task; renderers subscribe
//! to state snapshots over a watch channel and never drive
//! transitions. A second submission while a job is in flight is
//! rejected, and a single pasted link runs as a one-item batch through
//! the identical path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::channel::{ChannelEvent, ReconnectingChannel};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::reconcile::{ReconciledView, Reconciler};
use crate::transport::Transport;
use crate::types::{BatchJob, DownloadOutcome, JobState, LinkItem, ProgressEvent};

/// Read-only view of the orchestrator for presentation layers.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub state: JobState,
    /// Per-link outcomes in discovery order. After a job finishes this
    /// holds the final, immutable result set until the next submission.
    pub outcomes: Vec<DownloadOutcome>,
    /// Count of items with a terminal outcome; never decreases within
    /// one job.
    pub progress_cursor: usize,
    pub total: usize,
    /// Present iff `state` is `Failed`.
    pub error: Option<String>,
}

impl JobSnapshot {
    fn idle() -> Self {
        Self { state: JobState::Idle, outcomes: Vec::new(), progress_cursor: 0, total: 0, error: None }
    }
}

/// Everything a finished job produced: final outcomes plus the
/// reconciled authoritative view.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<DownloadOutcome>,
    pub view: ReconciledView,
}

/// Drives one batch download job end to end.
pub struct BatchOrchestrator {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    snapshot_tx: watch::Sender<JobSnapshot>,
    /// Cancellation generation counter; bumping it aborts the job in
    /// flight. A watch channel rather than a flag so a cancel can
    /// never be missed between suspension points.
    cancel_tx: watch::Sender<u64>,
    in_flight: AtomicBool,
}

impl BatchOrchestrator {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(JobSnapshot::idle());
        let (cancel_tx, _) = watch::channel(0);
        Self { transport, config, snapshot_tx, cancel_tx, in_flight: AtomicBool::new(false) }
    }

    /// Subscribe to state snapshots. The receiver always holds the
    /// latest snapshot; intermediate ones may be skipped.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> JobSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Cancel the job in flight, if any. The channel is closed,
    /// pending reconnects are suppressed, the reconciler is not
    /// invoked, and the published state is `Idle` before this returns.
    /// With no job in flight this is a no-op; the previous job's final
    /// snapshot stays published.
    pub fn cancel(&self) {
        self.cancel_tx.send_modify(|generation| *generation += 1);
        if self.in_flight.load(Ordering::SeqCst) {
            self.snapshot_tx.send_replace(JobSnapshot::idle());
            info!("job cancelled");
        }
    }

    /// Run a single pasted link as a one-item batch. Same state
    /// machine, same retry and fallback behavior.
    pub async fn run_single(&self, link: LinkItem) -> Result<BatchReport> {
        self.run_batch(vec![link]).await
    }

    /// Drive a batch job to completion and return the final report.
    ///
    /// Rejects the call if another job is already in flight. On
    /// failure the error is also published in a `Failed` snapshot; the
    /// orchestrator accepts a new submission either way.
    pub async fn run_batch(&self, items: Vec<LinkItem>) -> Result<BatchReport> {
        if items.is_empty() {
            return Err(Error::Submission("no links to download".into()));
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(Error::JobInFlight);
        }

        let result = self.drive(items).await;
        self.in_flight.store(false, Ordering::SeqCst);

        if let Err(e) = &result {
            match e {
                // cancel() already published the idle snapshot.
                Error::Cancelled => {}
                _ => {
                    warn!("job failed: {}", e);
                    self.snapshot_tx.send_modify(|snapshot| {
                        snapshot.state = JobState::Failed;
                        snapshot.error = Some(e.to_string());
                    });
                }
            }
        }
        result
    }

    async fn drive(&self, items: Vec<LinkItem>) -> Result<BatchReport> {
        let mut cancel_rx = self.cancel_tx.subscribe();

        // Submitting: register the job with the backend.
        self.snapshot_tx.send_replace(JobSnapshot {
            state: JobState::Submitting,
            outcomes: items.iter().map(|i| DownloadOutcome::pending(i.url())).collect(),
            progress_cursor: 0,
            total: items.len(),
            error: None,
        });

        let submitted = tokio::select! {
            _ = cancel_rx.changed() => return Err(Error::Cancelled),
            res = self.transport.submit_batch(&items) => res?,
        };
        info!(job = %submitted, "batch registered ({} items)", items.len());
        let mut job = BatchJob::new(submitted, items);

        // StreamingLive: consume the live channel until a terminal
        // event or exhaustion.
        let mut channel = ReconnectingChannel::new(
            Arc::clone(&self.transport),
            job.job_id.clone(),
            self.config.retry.clone(),
            self.config.liveness_window,
        );
        self.publish(JobState::StreamingLive, &job);

        enum Step {
            Cancelled,
            Channel(Option<ChannelEvent>),
        }

        let use_fallback = loop {
            // Cancellation outranks queued channel events: once the
            // generation bumps, nothing already buffered on the stream
            // may mutate outcomes or be published.
            let step = tokio::select! {
                biased;
                _ = cancel_rx.changed() => Step::Cancelled,
                event = channel.next_event() => Step::Channel(event),
            };
            match step {
                Step::Cancelled => {
                    channel.close();
                    return Err(Error::Cancelled);
                }
                Step::Channel(Some(ChannelEvent::Event(event))) => match event {
                    // Receiving it already reset the liveness window.
                    ProgressEvent::Heartbeat => {}
                    ProgressEvent::Item { link, status, error, .. } => {
                        if job.apply_item_progress(&link, status, error) {
                            self.publish(JobState::StreamingLive, &job);
                        } else {
                            debug!(link = %link, "ignored stale progress event");
                        }
                    }
                    ProgressEvent::Complete { results } => {
                        job.merge_complete(results);
                        channel.close();
                        break false;
                    }
                    ProgressEvent::Error { message } => {
                        channel.close();
                        return Err(Error::ServerReported(message));
                    }
                },
                Step::Channel(Some(ChannelEvent::Exhausted { attempts })) => {
                    warn!(attempts, "live channel exhausted, entering fallback");
                    break true;
                }
                // The channel only ends after close or exhaustion;
                // treat an early end as exhaustion anyway.
                Step::Channel(None) => break true,
            }
        };

        if use_fallback {
            self.fallback_poll(&mut job, &mut cancel_rx).await?;
        }

        // Completing: refresh the authoritative view, then settle.
        self.publish(JobState::Completing, &job);
        let view = Reconciler::new(Arc::clone(&self.transport)).refresh(job.outcomes()).await;

        self.snapshot_tx.send_replace(JobSnapshot {
            state: JobState::Idle,
            outcomes: job.outcomes().to_vec(),
            progress_cursor: job.progress_cursor(),
            total: job.total(),
            error: None,
        });
        info!(job = %job.job_id, "batch finished ({}/{} terminal)", job.progress_cursor(), job.total());

        Ok(BatchReport { outcomes: job.outcomes().to_vec(), view })
    }

    /// No live updates are available: issue the synchronous result
    /// fetch once, optionally ticking simulated progress for UI
    /// feedback while it is in flight. Simulated ticks never produce a
    /// terminal status, so the authoritative results always win.
    async fn fallback_poll(
        &self,
        job: &mut BatchJob,
        cancel_rx: &mut watch::Receiver<u64>,
    ) -> Result<()> {
        self.publish(JobState::FallbackPolling, job);

        // Clone what the fetch needs so the in-flight future does not
        // hold a borrow of the job we keep updating.
        let job_id = job.job_id.clone();
        let items = job.items.clone();
        let fetch = self.transport.fetch_batch_result(&job_id, &items);
        tokio::pin!(fetch);

        let mut ticker = tokio::time::interval(self.config.fallback_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel_rx.changed() => return Err(Error::Cancelled),
                res = &mut fetch => {
                    let results = res?;
                    job.merge_complete(results);
                    self.publish(JobState::FallbackPolling, job);
                    return Ok(());
                }
                _ = ticker.tick(), if self.config.simulate_fallback_progress => {
                    if job.simulate_tick() {
                        self.publish(JobState::FallbackPolling, job);
                    }
                }
            }
        }
    }

    fn publish(&self, state: JobState, job: &BatchJob) {
        self.snapshot_tx.send_replace(JobSnapshot {
            state,
            outcomes: job.outcomes().to_vec(),
            progress_cursor: job.progress_cursor(),
            total: job.total(),
            error: None,
        });
    }
}
