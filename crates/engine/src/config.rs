//! Configuration via `vigil.toml`
//!
//! Every field has a default, so an empty or partial file is valid.
//! `vigil init` writes a commented default file next to the store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vigil_concurrency::LockConfig;
use vigil_core::{Error, Result};
use vigil_durability::FingerprintMode;

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "vigil.toml";

/// Default store file name
pub const DEFAULT_STORE_FILE: &str = "violations.csv";

/// `[store]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path of the shared store file
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_FILE),
        }
    }
}

/// `[lock]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Give up waiting for exclusive access after this many milliseconds
    pub timeout_ms: u64,
    /// Pause between lock attempts
    pub retry_interval_ms: u64,
    /// Holder records older than this are reported as stale
    pub stale_after_ms: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        let d = LockConfig::default();
        Self {
            timeout_ms: d.timeout.as_millis() as u64,
            retry_interval_ms: d.retry_interval.as_millis() as u64,
            stale_after_ms: d.stale_after.as_millis() as u64,
        }
    }
}

impl LockSettings {
    /// Coordinator timing built from these settings
    pub fn to_lock_config(&self) -> LockConfig {
        LockConfig::default()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_retry_interval(Duration::from_millis(self.retry_interval_ms))
            .with_stale_after(Duration::from_millis(self.stale_after_ms))
    }
}

/// `[monitor]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Time between polls
    pub poll_interval_ms: u64,
    /// Fingerprint strength: "metadata" or "content"
    pub fingerprint: FingerprintMode,
    /// Wake early on filesystem events (needs the `watch` feature)
    pub watch: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            fingerprint: FingerprintMode::Metadata,
            watch: false,
        }
    }
}

impl MonitorSettings {
    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Configuration loaded from `vigil.toml`
///
/// # Example
///
/// ```toml
/// [store]
/// path = "violations.csv"
///
/// [lock]
/// timeout_ms = 5000
///
/// [monitor]
/// poll_interval_ms = 5000
/// fingerprint = "metadata"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    /// Store location
    pub store: StoreSettings,
    /// Access coordination timing
    pub lock: LockSettings,
    /// Change monitor behaviour
    pub monitor: MonitorSettings,
}

impl VigilConfig {
    /// Set the store path
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = path.into();
        self
    }

    /// Set the lock acquisition timeout
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the staleness threshold for lock holder records
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.lock.stale_after_ms = stale_after.as_millis() as u64;
        self
    }

    /// Set the monitor poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.monitor.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the fingerprint mode
    pub fn with_fingerprint(mut self, mode: FingerprintMode) -> Self {
        self.monitor.fingerprint = mode;
        self
    }

    /// Enable or disable filesystem-event wakeups
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.monitor.watch = watch;
        self
    }

    /// Lock timing as a coordinator config
    pub fn lock_config(&self) -> LockConfig {
        self.lock.to_lock_config()
    }

    /// Reject settings that cannot work
    ///
    /// # Errors
    ///
    /// `Error::Config` for an empty store path or a zero duration.
    pub fn validate(&self) -> Result<()> {
        if self.store.path.as_os_str().is_empty() {
            return Err(Error::config("store.path must not be empty"));
        }
        let durations = [
            ("lock.timeout_ms", self.lock.timeout_ms),
            ("lock.retry_interval_ms", self.lock.retry_interval_ms),
            ("lock.stale_after_ms", self.lock.stale_after_ms),
            ("monitor.poll_interval_ms", self.monitor.poll_interval_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(Error::config(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }

    /// Store path, resolved against `base` when relative
    pub fn store_path_in(&self, base: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            base.join(&self.store.path)
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Vigil configuration

[store]
# Shared record store; relative paths resolve against this file's directory
path = "violations.csv"

[lock]
# Give up waiting for exclusive access after this long
timeout_ms = 5000
# Pause between lock attempts
retry_interval_ms = 20
# A holder record older than this is reported as stale when reclaimed
stale_after_ms = 60000

[monitor]
# How often the change monitor checks the store
poll_interval_ms = 5000
# "metadata" = length, mtime, inode
# "content"  = metadata plus a content hash (coarse-mtime filesystems)
fingerprint = "metadata"
# Wake on filesystem events as well as on the interval.
# Requires the "watch" feature to be compiled in.
watch = false
"#
    }

    /// Read, parse and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: VigilConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns whether a file was written.
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| {
            Error::config(format!(
                "Failed to write default config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(true)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
