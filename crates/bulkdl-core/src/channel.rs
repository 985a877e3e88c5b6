//! Reconnecting live channel.
//!
//! Owns the underlying connection for the lifetime of one job and
//! hides transient drops from the orchestrator: bounded retries with
//! linear backoff, and a liveness window so a silent connection is
//! treated as dead instead of waiting for an OS-level close.
//!
//! The design is pull-driven: every timer lives inside the
//! [`ReconnectingChannel::next_event`] future, so closing or dropping
//! the channel suppresses any scheduled reconnect and nothing can be
//! delivered afterwards.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::transport::{ProgressStream, Transport};
use crate::types::{JobId, ProgressEvent};

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// What the channel hands the orchestrator.
#[derive(Debug)]
pub enum ChannelEvent {
    /// A progress event from the live stream.
    Event(ProgressEvent),
    /// The reconnect budget is spent; the channel is closed for good
    /// and the orchestrator should fall back to polling.
    Exhausted { attempts: u32 },
}

/// Resilient wrapper around [`Transport::open_progress_channel`] for
/// exactly one job.
pub struct ReconnectingChannel {
    transport: Arc<dyn Transport>,
    job: JobId,
    retry: RetryConfig,
    liveness_window: Duration,
    stream: Option<ProgressStream>,
    /// Consecutive failed open attempts; reset on a successful open.
    failures: u32,
    state: ChannelState,
}

impl ReconnectingChannel {
    pub fn new(
        transport: Arc<dyn Transport>,
        job: JobId,
        retry: RetryConfig,
        liveness_window: Duration,
    ) -> Self {
        Self {
            transport,
            job,
            retry,
            liveness_window,
            stream: None,
            failures: 0,
            state: ChannelState::Connecting,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Close the channel explicitly. No event is delivered after this.
    pub fn close(&mut self) {
        self.stream = None;
        self.state = ChannelState::Closed;
    }

    /// Wait for the next channel event.
    ///
    /// Reconnects transparently on open failure, read error, stream
    /// end, and liveness expiry. Yields `Exhausted` exactly once when
    /// the retry budget is spent, then `None` forever.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            if self.state == ChannelState::Closed {
                return None;
            }
            if self.stream.is_none() && !self.reopen().await {
                self.state = ChannelState::Closed;
                return Some(ChannelEvent::Exhausted { attempts: self.retry.max_attempts });
            }
            let Some(stream) = self.stream.as_mut() else {
                continue;
            };

            match timeout(self.liveness_window, stream.next()).await {
                Ok(Some(Ok(event))) => return Some(ChannelEvent::Event(event)),
                Ok(Some(Err(e))) => {
                    warn!("live channel read error: {}", e);
                    self.stream = None;
                }
                Ok(None) => {
                    debug!("live channel ended without a terminal event");
                    self.stream = None;
                }
                Err(_) => {
                    warn!(
                        "no traffic for {:?}, presuming live channel dead",
                        self.liveness_window
                    );
                    self.stream = None;
                }
            }
        }
    }

    /// Bounded reconnect: attempt N waits `N * base_delay` first.
    /// Returns false once `max_attempts` consecutive opens have failed.
    async fn reopen(&mut self) -> bool {
        self.state = ChannelState::Connecting;
        while self.failures < self.retry.max_attempts {
            if self.failures > 0 {
                let delay = self.retry.base_delay * self.failures;
                debug!(attempt = self.failures, "waiting {:?} before reconnect", delay);
                sleep(delay).await;
            }
            match self.transport.open_progress_channel(&self.job).await {
                Ok(stream) => {
                    self.stream = Some(stream);
                    self.failures = 0;
                    self.state = ChannelState::Open;
                    return true;
                }
                Err(e) => {
                    self.failures += 1;
                    warn!(attempt = self.failures, "live channel open failed: {}", e);
                }
            }
        }
        false
    }
}
