//! Change monitor: turns store rewrites into per-record events
//!
//! A poll compares the store fingerprint with the last one seen; only on a
//! mismatch is the file reloaded and diffed against the cached snapshot.
//! Delivery is at-least-once and eventually consistent: several edits to
//! one record between polls arrive as one net event.
//!
//! Polling only reads and never takes the store lock. A poll that fails to
//! load (say, a hand-edited file mid-save) does not advance the cached
//! fingerprint, so the next poll tries again.

mod diff;
#[cfg(feature = "watch")]
mod watch;

pub use diff::{diff_records, ChangeEvent, ChangeKind};

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};
use vigil_core::{Error, Result, ViolationRecord};
use vigil_durability::{AtomicStore, FingerprintMode, StoreFingerprint};

use crate::config::MonitorSettings;

/// Where the monitor is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Waiting for the next poll
    Idle,
    /// Checking the fingerprint or reloading
    Polling,
    /// Delivering events to subscribers
    Notifying,
}

/// Messages that end a wait between polls early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    /// Something touched the store directory
    Changed,
    /// Shut the loop down
    Stop,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<MonitorState>,
    subscribers: Mutex<Vec<Sender<ChangeEvent>>>,
}

impl Shared {
    fn set_state(&self, state: MonitorState) {
        *self.state.lock() = state;
    }

    fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }

    fn publish(&self, events: &[ChangeEvent]) {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|tx| events.iter().all(|e| tx.send(e.clone()).is_ok()));
        if subscribers.len() < before {
            debug!(dropped = before - subscribers.len(), "Pruned disconnected subscribers");
        }
    }
}

/// Polls one store and reports net record changes
#[derive(Debug)]
pub struct ChangeMonitor {
    store: AtomicStore,
    settings: MonitorSettings,
    fingerprint: Option<StoreFingerprint>,
    records: Vec<ViolationRecord>,
    shared: Arc<Shared>,
}

impl ChangeMonitor {
    /// Monitor `path`, taking the current content as the baseline
    ///
    /// Records already present are never reported as added.
    ///
    /// # Errors
    ///
    /// Fails if the baseline cannot be loaded.
    pub fn new(path: impl Into<PathBuf>, settings: MonitorSettings) -> Result<Self> {
        let store = AtomicStore::new(path);
        // Fingerprint before loading: a write in between shows up next poll
        let fingerprint = store.fingerprint(settings.fingerprint)?;
        let records = store.load()?;
        info!(
            path = %store.path().display(),
            tracking = records.len(),
            "Change monitor baselined"
        );
        Ok(Self {
            store,
            settings,
            fingerprint,
            records,
            shared: Arc::new(Shared {
                state: Mutex::new(MonitorState::Idle),
                subscribers: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Store file path
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Current cycle state
    pub fn state(&self) -> MonitorState {
        *self.shared.state.lock()
    }

    /// Last snapshot the monitor has seen
    pub fn records(&self) -> &[ViolationRecord] {
        &self.records
    }

    /// Fingerprint mode in use
    pub fn fingerprint_mode(&self) -> FingerprintMode {
        self.settings.fingerprint
    }

    /// New receiver for every event from now on
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.shared.subscribe()
    }

    /// Run one poll cycle
    ///
    /// Returns the events delivered to subscribers, empty if nothing
    /// changed.
    pub fn poll_once(&mut self) -> Result<Vec<ChangeEvent>> {
        self.shared.set_state(MonitorState::Polling);
        let result = self.detect();
        if let Ok(events) = &result {
            if !events.is_empty() {
                self.shared.set_state(MonitorState::Notifying);
                self.shared.publish(events);
            }
        }
        self.shared.set_state(MonitorState::Idle);
        result
    }

    fn detect(&mut self) -> Result<Vec<ChangeEvent>> {
        let fingerprint = self.store.fingerprint(self.settings.fingerprint)?;
        if fingerprint == self.fingerprint {
            return Ok(Vec::new());
        }

        let records = match self.store.load() {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    path = %self.store.path().display(),
                    error = %e,
                    "Store changed but could not be loaded; will retry"
                );
                return Err(e);
            }
        };

        let events = diff_records(&self.records, &records);
        debug!(
            path = %self.store.path().display(),
            records = records.len(),
            events = events.len(),
            "Store changed"
        );
        self.fingerprint = fingerprint;
        self.records = records;
        Ok(events)
    }

    /// Run the poll loop on a background thread
    ///
    /// The thread polls every `poll_interval`, and sooner on filesystem
    /// events when `watch` is enabled and compiled in. Poll failures are
    /// logged and retried on the next cycle.
    pub fn spawn(mut self) -> Result<MonitorHandle> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (wake_tx, wake_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let interval = self.settings.poll_interval();

        #[cfg(feature = "watch")]
        let watcher = if self.settings.watch {
            match watch::StoreWatcher::start(self.store.path(), wake_tx.clone()) {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!(error = %e, "Filesystem watch unavailable; polling only");
                    None
                }
            }
        } else {
            None
        };
        #[cfg(not(feature = "watch"))]
        {
            if self.settings.watch {
                warn!("watch = true but the watch feature is not compiled in; polling only");
            }
        }

        let stop = Arc::clone(&shutdown);
        let thread = std::thread::Builder::new()
            .name("vigil-monitor".to_string())
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    if let Err(e) = self.poll_once() {
                        warn!(error = %e, "Poll failed");
                    }
                    if !wait(&wake_rx, interval) {
                        break;
                    }
                }
                debug!("Change monitor stopped");
            })
            .map_err(Error::Io)?;

        Ok(MonitorHandle {
            shutdown,
            wake: wake_tx,
            thread: Some(thread),
            shared,
            #[cfg(feature = "watch")]
            _watcher: watcher,
        })
    }
}

/// Sleep until the interval elapses or a wakeup arrives; false means stop
fn wait(wake: &Receiver<Wake>, interval: Duration) -> bool {
    match wake.recv_timeout(interval) {
        Ok(Wake::Changed) => {
            // Coalesce a burst of filesystem events into one poll
            while let Ok(next) = wake.try_recv() {
                if next == Wake::Stop {
                    return false;
                }
            }
            true
        }
        Err(RecvTimeoutError::Timeout) => true,
        Ok(Wake::Stop) | Err(RecvTimeoutError::Disconnected) => false,
    }
}

/// Running background monitor; stops and joins on drop
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: Arc<AtomicBool>,
    wake: Sender<Wake>,
    thread: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
    #[cfg(feature = "watch")]
    _watcher: Option<watch::StoreWatcher>,
}

impl MonitorHandle {
    /// New receiver for every event from now on
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.shared.subscribe()
    }

    /// Current cycle state of the background loop
    pub fn state(&self) -> MonitorState {
        *self.shared.state.lock()
    }

    /// Ask for a poll now instead of at the end of the interval
    pub fn poll_now(&self) {
        let _ = self.wake.send(Wake::Changed);
    }

    /// Stop the loop and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.wake.send(Wake::Stop);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
