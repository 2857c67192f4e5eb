//! Filesystem-event wakeups for the poll loop
//!
//! Watches the directory holding the store (the store file itself is
//! replaced by rename on every write, which would detach a watch on it) and
//! nudges the loop when an event names the store. Whether anything actually
//! changed is still decided by the fingerprint.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::Duration;
use tracing::{debug, info, warn};

use vigil_core::{Error, Result};

use super::Wake;

const DEBOUNCE: Duration = Duration::from_millis(200);

pub(crate) struct StoreWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl fmt::Debug for StoreWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreWatcher").finish_non_exhaustive()
    }
}

fn watch_error(e: notify::Error) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::Other, e.to_string()))
}

impl StoreWatcher {
    pub(crate) fn start(store_path: &Path, wake: Sender<Wake>) -> Result<Self> {
        let dir = match store_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        let name: Option<OsString> = store_path.file_name().map(|n| n.to_os_string());

        let mut debouncer = new_debouncer(DEBOUNCE, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let touched = events
                        .iter()
                        .any(|e| e.path.file_name().map(|n| n.to_os_string()) == name);
                    if touched {
                        debug!("Store touched on disk");
                        let _ = wake.send(Wake::Changed);
                    }
                }
                Err(e) => warn!(error = %e, "Watch error"),
            }
        })
        .map_err(watch_error)?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;
        info!(dir = %dir.display(), "Watching store directory");

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}
