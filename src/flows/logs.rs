/// Log viewer flow: poll `/logs` on a fixed interval while the view is
/// active.
///
/// [`LogViewer::activate`] fetches once immediately and then once per
/// interval on a background thread. The returned [`LogPoller`] controls that
/// thread: [`LogPoller::stop`] or dropping the poller marks it cancelled and
/// closes the cancellation channel without waiting. A fetch already in
/// flight is left to finish on its own and its response is discarded; no
/// new fetch starts after teardown returns. Polls run one after another on
/// that single thread; each result replaces the previous collection
/// wholesale.
///
/// Fetch failures go to the developer console and leave the last-known
/// collection in place. Nothing is retried early; the next tick simply polls
/// again.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::api::types::LogCollection;
use crate::api::{ApiClient, ApiError};
use crate::session::SessionStore;

use super::{FlowError, console_error, require_token};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// What a single poll produced.
#[derive(Debug)]
pub enum PollOutcome<'a> {
    Updated(&'a LogCollection),
    Failed(&'a ApiError),
}

#[derive(Debug, Clone)]
pub struct LogViewer {
    api: ApiClient,
    session: SessionStore,
    interval: Duration,
}

impl LogViewer {
    pub fn new(api: ApiClient, session: SessionStore, interval: Duration) -> Self {
        Self {
            api,
            session,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling. `on_poll` runs on the polling thread after every fetch.
    pub fn activate<F>(&self, on_poll: F) -> Result<LogPoller, FlowError>
    where
        F: FnMut(PollOutcome<'_>) + Send + 'static,
    {
        require_token(&self.session)?;
        Ok(LogPoller::start(self.api.clone(), self.interval, on_poll))
    }
}

/// Handle to a running log poll. Cancels on drop.
pub struct LogPoller {
    latest: Arc<Mutex<LogCollection>>,
    polls: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
    cancel: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl LogPoller {
    fn start<F>(api: ApiClient, interval: Duration, mut on_poll: F) -> Self
    where
        F: FnMut(PollOutcome<'_>) + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let latest = Arc::new(Mutex::new(LogCollection::default()));
        let polls = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker = {
            let latest = Arc::clone(&latest);
            let polls = Arc::clone(&polls);
            let cancelled = Arc::clone(&cancelled);
            thread::spawn(move || {
                while !cancelled.load(Ordering::SeqCst) {
                    polls.fetch_add(1, Ordering::SeqCst);
                    let result = api.logs();

                    // A response that lands after cancellation is discarded.
                    if cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                    match result {
                        Ok(collection) => {
                            *latest.lock().unwrap_or_else(|p| p.into_inner()) =
                                collection.clone();
                            on_poll(PollOutcome::Updated(&collection));
                        }
                        Err(err) => {
                            console_error("Error fetching logs", &err);
                            on_poll(PollOutcome::Failed(&err));
                        }
                    }

                    match cancel_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
        };

        Self {
            latest,
            polls,
            cancelled,
            cancel: Some(cancel_tx),
            worker: Some(worker),
        }
    }

    /// The most recently received collection.
    pub fn latest(&self) -> LogCollection {
        self.latest
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Number of fetches issued so far.
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Cancel polling. Returns without waiting for an in-flight fetch; its
    /// response is dropped and no further fetch starts.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // Closing the channel wakes the worker out of its wait.
        drop(self.cancel.take());
        // Detach: a hung request must not hold up the owner.
        drop(self.worker.take());
    }
}

impl Drop for LogPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for LogPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogPoller")
            .field("polls", &self.poll_count())
            .field("running", &self.is_running())
            .finish()
    }
}
