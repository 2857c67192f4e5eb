//! Cross-process exclusive access to the record store
//!
//! Mutations are load → mutate → replace. Two of those interleaving would
//! lose an update, so every mutation runs inside
//! [`AccessCoordinator::with_exclusive_access`].
//!
//! # Protocol
//!
//! - The lock is an OS advisory lock (`flock` on unix) on a sentinel file
//!   next to the store (`violations.csv.lock`), never on the store itself:
//!   the store is replaced by rename, which would orphan a lock held on it.
//! - Acquisition polls `try_lock_exclusive` until a deadline and fails with
//!   `LockTimeout` instead of blocking forever. Nothing is written before
//!   the lock is granted.
//! - The holder records its pid and acquisition time in the sentinel and
//!   truncates it on release. The sentinel is never unlinked: a waiter may
//!   already have it open, and unlinking would let two processes lock two
//!   different inodes.
//!
//! # Stale holders
//!
//! The OS drops the lock when its holder dies, so a crashed holder can
//! never wedge other processes. What it leaves behind is its holder record.
//! Finding one after acquiring means the previous holder exited without
//! releasing; if it is older than `stale_after` the acquisition is reported
//! as a stale reclaim. A lock that is still held by a live process is never
//! broken, however old; waiters log it once and keep waiting until timeout.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};
use vigil_core::{Error, Result};

/// Suffix appended to the store file name to form the sentinel path
pub const LOCK_SUFFIX: &str = ".lock";

/// Timing parameters for lock acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockConfig {
    /// Give up after waiting this long
    pub timeout: Duration,
    /// Pause between attempts
    pub retry_interval: Duration,
    /// Holder records older than this are considered stale
    pub stale_after: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry_interval: Duration::from_millis(20),
            stale_after: Duration::from_secs(60),
        }
    }
}

impl LockConfig {
    /// Set the acquisition timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry interval
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set the staleness threshold
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }
}

/// Who holds (or last held) the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderInfo {
    /// Process id of the holder
    pub pid: u32,
    /// Acquisition time, milliseconds since the Unix epoch
    pub acquired_at_ms: u64,
}

impl HolderInfo {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at_ms: now_millis(),
        }
    }

    /// Time since the holder acquired the lock
    pub fn age(&self) -> Duration {
        Duration::from_millis(now_millis().saturating_sub(self.acquired_at_ms))
    }

    fn encode(&self) -> String {
        format!("pid={}\nacquired_at_ms={}\n", self.pid, self.acquired_at_ms)
    }

    /// Parse a sentinel's content; `None` if empty or unrecognized
    pub fn decode(text: &str) -> Option<Self> {
        let mut pid = None;
        let mut acquired_at_ms = None;
        for line in text.lines() {
            match line.split_once('=') {
                Some(("pid", v)) => pid = v.trim().parse().ok(),
                Some(("acquired_at_ms", v)) => acquired_at_ms = v.trim().parse().ok(),
                _ => {}
            }
        }
        Some(Self {
            pid: pid?,
            acquired_at_ms: acquired_at_ms?,
        })
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn read_holder(file: &mut File) -> io::Result<Option<HolderInfo>> {
    let mut text = String::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_string(&mut text)?;
    Ok(HolderInfo::decode(&text))
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Serializes mutations of one store across processes
#[derive(Debug, Clone)]
pub struct AccessCoordinator {
    lock_path: PathBuf,
    config: LockConfig,
}

impl AccessCoordinator {
    /// Coordinator using the sentinel file at `lock_path`
    pub fn new(lock_path: impl Into<PathBuf>, config: LockConfig) -> Self {
        Self {
            lock_path: lock_path.into(),
            config,
        }
    }

    /// Coordinator for the store at `store_path` (`<store>.lock`)
    pub fn for_store(store_path: &Path, config: LockConfig) -> Self {
        let mut name = store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store".into());
        name.push(LOCK_SUFFIX);
        Self::new(store_path.with_file_name(name), config)
    }

    /// Sentinel file path
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Timing parameters
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Run `f` while holding exclusive access
    ///
    /// The lock is released when `f` returns, fails or panics.
    ///
    /// # Errors
    ///
    /// `LockTimeout` if access was not granted in time (`f` is not run),
    /// otherwise whatever `f` returns.
    pub fn with_exclusive_access<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let guard = self.acquire()?;
        let result = f();
        drop(guard);
        result
    }

    /// Acquire exclusive access, waiting up to the configured timeout
    pub fn acquire(&self) -> Result<ExclusiveGuard> {
        if let Some(parent) = self.lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;

        let start = Instant::now();
        let mut reported_long_hold = false;
        loop {
            match fs2::FileExt::try_lock_exclusive(&file) {
                Ok(()) => break,
                Err(e) if is_contended(&e) => {}
                Err(e) => return Err(Error::Io(e)),
            }

            let waited = start.elapsed();
            if waited >= self.config.timeout {
                warn!(
                    path = %self.lock_path.display(),
                    waited_ms = waited.as_millis() as u64,
                    "Timed out waiting for exclusive access"
                );
                return Err(Error::LockTimeout {
                    path: self.lock_path.clone(),
                    waited,
                });
            }

            if !reported_long_hold {
                if let Ok(Some(holder)) = read_holder(&mut file) {
                    if holder.age() > self.config.stale_after {
                        warn!(
                            path = %self.lock_path.display(),
                            holder_pid = holder.pid,
                            held_ms = holder.age().as_millis() as u64,
                            "Lock held past stale threshold by a live process; not breaking it"
                        );
                        reported_long_hold = true;
                    }
                }
            }

            std::thread::sleep(self.config.retry_interval.min(self.config.timeout - waited));
        }

        let previous = read_holder(&mut file).unwrap_or(None);
        let reclaimed_stale = match previous {
            Some(holder) if holder.age() > self.config.stale_after => {
                warn!(
                    path = %self.lock_path.display(),
                    previous_pid = holder.pid,
                    age_ms = holder.age().as_millis() as u64,
                    "Reclaiming stale lock"
                );
                true
            }
            Some(holder) => {
                info!(
                    path = %self.lock_path.display(),
                    previous_pid = holder.pid,
                    "Previous holder exited without releasing the lock"
                );
                false
            }
            None => false,
        };

        let holder = HolderInfo::current();
        let stamped = (|| -> io::Result<()> {
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(holder.encode().as_bytes())?;
            file.flush()
        })();
        if let Err(e) = stamped {
            // Diagnostic only; the OS lock is what excludes other writers
            debug!(path = %self.lock_path.display(), error = %e, "Could not record lock holder");
        }

        debug!(
            path = %self.lock_path.display(),
            waited_ms = start.elapsed().as_millis() as u64,
            "Exclusive access granted"
        );

        Ok(ExclusiveGuard {
            file,
            path: self.lock_path.clone(),
            acquired: Instant::now(),
            previous,
            reclaimed_stale,
        })
    }

    /// Current holder record, if any
    ///
    /// Reads the sentinel without locking; the answer may be outdated by
    /// the time it is returned.
    pub fn holder(&self) -> Result<Option<HolderInfo>> {
        match File::open(&self.lock_path) {
            Ok(mut file) => Ok(read_holder(&mut file)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Proof of exclusive access; released on drop
#[derive(Debug)]
pub struct ExclusiveGuard {
    file: File,
    path: PathBuf,
    acquired: Instant,
    previous: Option<HolderInfo>,
    reclaimed_stale: bool,
}

impl ExclusiveGuard {
    /// Whether acquiring this guard reclaimed a stale holder record
    pub fn reclaimed_stale(&self) -> bool {
        self.reclaimed_stale
    }

    /// Holder record left by a previous holder that did not release
    pub fn previous_holder(&self) -> Option<HolderInfo> {
        self.previous
    }

    /// Sentinel file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ExclusiveGuard {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = fs2::FileExt::unlock(&self.file);
        debug!(
            path = %self.path.display(),
            held_ms = self.acquired.elapsed().as_millis() as u64,
            "Exclusive access released"
        );
    }
}
