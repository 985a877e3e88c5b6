//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::transport::{ProgressStream, Transport};
use crate::types::{DownloadOutcome, HistoryEntry, JobId, LinkItem, ProgressEvent, RemoteFile};

/// What one `open_progress_channel` call should produce.
pub(crate) enum OpenScript {
    /// The open itself fails.
    Fail,
    /// Yield these events, then end the stream.
    Events(Vec<ProgressEvent>),
    /// Yield these events, then go silent forever.
    EventsThenSilence(Vec<ProgressEvent>),
    /// Yield these events with a delay before each one.
    EventsSpaced(Vec<ProgressEvent>, Duration),
    /// Yield whatever the test pushes into the queue, as it arrives.
    Queued(mpsc::UnboundedReceiver<ProgressEvent>),
}

/// Fake [`Transport`] with per-call scripts and call counters.
pub(crate) struct FakeTransport {
    pub submit_response: Mutex<Option<Result<JobId>>>,
    opens: Mutex<VecDeque<OpenScript>>,
    pub fetch_response: Mutex<Option<Result<Vec<DownloadOutcome>>>>,
    pub fetch_delay: Mutex<Duration>,
    pub history: Mutex<Vec<HistoryEntry>>,
    pub files: Mutex<Vec<RemoteFile>>,

    pub submit_calls: AtomicUsize,
    pub open_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    /// Item count passed to the last fetch, to assert singleton routing.
    pub last_fetch_items: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            submit_response: Mutex::new(None),
            opens: Mutex::new(VecDeque::new()),
            fetch_response: Mutex::new(None),
            fetch_delay: Mutex::new(Duration::ZERO),
            history: Mutex::new(Vec::new()),
            files: Mutex::new(Vec::new()),
            submit_calls: AtomicUsize::new(0),
            open_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            last_fetch_items: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeTransport {
    pub fn script_opens(&self, scripts: Vec<OpenScript>) {
        *self.opens.lock().unwrap() = scripts.into();
    }

    pub fn script_fetch(&self, response: Result<Vec<DownloadOutcome>>) {
        *self.fetch_response.lock().unwrap() = Some(response);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn submit_batch(&self, _items: &[LinkItem]) -> Result<JobId> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.submit_response.lock().unwrap().take() {
            Some(response) => response,
            None => Ok(JobId("job-1".into())),
        }
    }

    async fn open_progress_channel(&self, _job: &JobId) -> Result<ProgressStream> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.opens.lock().unwrap().pop_front();
        match script {
            None | Some(OpenScript::Fail) => Err(Error::channel("scripted open failure")),
            Some(OpenScript::Events(events)) => {
                Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
            }
            Some(OpenScript::EventsThenSilence(events)) => Ok(Box::pin(
                stream::iter(events.into_iter().map(Ok)).chain(stream::pending()),
            )),
            Some(OpenScript::EventsSpaced(events, gap)) => Ok(Box::pin(async_stream::stream! {
                for event in events {
                    tokio::time::sleep(gap).await;
                    yield Ok(event);
                }
            })),
            Some(OpenScript::Queued(mut rx)) => Ok(Box::pin(async_stream::stream! {
                while let Some(event) = rx.recv().await {
                    yield Ok(event);
                }
            })),
        }
    }

    async fn fetch_batch_result(
        &self,
        _job: &JobId,
        items: &[LinkItem],
    ) -> Result<Vec<DownloadOutcome>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.last_fetch_items.store(items.len(), Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        match self.fetch_response.lock().unwrap().take() {
            Some(response) => response,
            None => Ok(Vec::new()),
        }
    }

    async fn list_files(&self) -> Result<Vec<RemoteFile>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.lock().unwrap().clone())
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.history.lock().unwrap().clone())
    }

    async fn clear_history(&self) -> Result<()> {
        self.history.lock().unwrap().clear();
        Ok(())
    }
}
