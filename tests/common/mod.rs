//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
pub use vigil::{
    ChangeKind, Error, FingerprintMode, RecordDraft, RecordFilter, RecordPatch, VigilConfig,
    ViolationStore,
};

/// A store in its own temporary directory
pub struct TestStore {
    pub dir: TempDir,
    pub store: ViolationStore,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let store = ViolationStore::open(Self::config_in(dir.path())).expect("open store");
        Self { dir, store }
    }

    /// Config for the store in `dir`, tuned for fast tests
    pub fn config_in(dir: &Path) -> VigilConfig {
        VigilConfig::default()
            .with_store_path(dir.join("violations.csv"))
            .with_lock_timeout(Duration::from_secs(30))
            .with_poll_interval(Duration::from_millis(20))
            .with_fingerprint(FingerprintMode::Content)
    }

    pub fn config(&self) -> VigilConfig {
        Self::config_in(self.dir.path())
    }

    pub fn path(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }

    /// Another independent handle, as another process would open
    pub fn reopen(&self) -> ViolationStore {
        ViolationStore::open(self.config()).expect("reopen store")
    }
}

pub fn helmet() -> RecordDraft {
    RecordDraft::new("01/02/24 09:15 AM", "A1", "S3", "NoHelmet")
}

pub fn draft_in(area: &str, section: &str) -> RecordDraft {
    RecordDraft::new("03/14/24 02:30 PM", area, section, "NoVest")
}
