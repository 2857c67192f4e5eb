//! Crash-safe record store
//!
//! The whole record set lives in one delimited-text file. Every write
//! replaces the file using the write-fsync-rename pattern.
//!
//! # Crash Safety
//!
//! 1. Write to a fresh temporary file in the same directory
//!    (`.<name>.<pid>.<seq>.tmp`, created with `create_new`)
//! 2. fsync the temporary file
//! 3. Atomic rename over the store path
//! 4. fsync the parent directory
//!
//! The rename is the only step visible to readers, so a reader sees either
//! the complete old file or the complete new one. If anything fails before
//! the rename, the temporary file is removed and the store path is untouched.
//!
//! # Concurrency
//!
//! `AtomicStore` does not lock. Single-record mutations are
//! load → mutate → `replace_all`; callers that can race with other writers
//! must run them under exclusive access (see `vigil-concurrency`).

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};
use vigil_core::{Error, Result, ViolationRecord};

use crate::fingerprint::{FingerprintMode, StoreFingerprint};
use crate::format::table::{decode_table, encode_table};

/// Distinguishes temporary files created by threads of one process
static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Suffix shared by every temporary store file
const TEMP_SUFFIX: &str = ".tmp";

/// Point reached by an in-flight `replace_all`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteStage {
    /// Temporary file created, nothing written
    Created,
    /// Content written, not yet synced
    Written,
    /// Content synced, not yet renamed
    Synced,
}

/// Durable, atomically replaced record file
#[derive(Debug, Clone)]
pub struct AtomicStore {
    path: PathBuf,
}

impl AtomicStore {
    /// Store backed by the file at `path`
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string())
    }

    fn temp_prefix(&self) -> String {
        format!(".{}.", self.file_name())
    }

    fn temp_path(&self) -> PathBuf {
        let seq = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.dir().join(format!(
            "{}{}.{}{}",
            self.temp_prefix(),
            std::process::id(),
            seq,
            TEMP_SUFFIX
        ))
    }

    /// Read the full ordered record set
    ///
    /// A missing file is an empty store (first run). Any row that fails to
    /// parse fails the whole load with `StoreCorrupt`.
    pub fn load(&self) -> Result<Vec<ViolationRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store file missing, starting empty");
                return Ok(Vec::new());
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(Error::corrupt(&self.path, 0, "file is not valid UTF-8"));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let records =
            decode_table(&text).map_err(|e| Error::corrupt(&self.path, e.line, e.reason))?;
        debug!(path = %self.path.display(), records = records.len(), "Store loaded");
        Ok(records)
    }

    /// Atomically replace the whole record set
    ///
    /// # Errors
    ///
    /// `StoreWriteFailed` if any step before the rename fails. The store
    /// file is then exactly as it was and no temporary file remains.
    pub fn replace_all(&self, records: &[ViolationRecord]) -> Result<()> {
        self.commit_with(records, |_| Ok(()))
    }

    /// `replace_all` with a hook run after each pre-rename stage
    ///
    /// An error from the hook aborts the write as a real I/O failure would.
    pub(crate) fn commit_with<F>(&self, records: &[ViolationRecord], mut hook: F) -> Result<()>
    where
        F: FnMut(WriteStage) -> io::Result<()>,
    {
        let dir = self.dir();
        fs::create_dir_all(&dir).map_err(|e| Error::write_failed(&self.path, e))?;

        let temp_path = self.temp_path();
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .map_err(|e| Error::write_failed(&self.path, e))?;

        let encoded = encode_table(records);
        let written = (|| -> io::Result<()> {
            hook(WriteStage::Created)?;
            file.write_all(encoded.as_bytes())?;
            hook(WriteStage::Written)?;
            file.sync_all()?;
            hook(WriteStage::Synced)?;
            Ok(())
        })();
        drop(file);

        if let Err(e) = written {
            warn!(
                temp_path = %temp_path.display(),
                error = %e,
                "Write failed, cleaning up temp file"
            );
            let _ = fs::remove_file(&temp_path);
            return Err(Error::write_failed(&self.path, e));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            warn!(
                temp_path = %temp_path.display(),
                error = %e,
                "Rename failed, cleaning up temp file"
            );
            let _ = fs::remove_file(&temp_path);
            return Err(Error::write_failed(&self.path, e));
        }

        // The new content is committed from here on; a failed directory
        // sync only weakens durability across power loss.
        if let Err(e) = sync_dir(&dir) {
            warn!(dir = %dir.display(), error = %e, "Directory fsync failed after rename");
        }

        info!(
            path = %self.path.display(),
            records = records.len(),
            bytes = encoded.len(),
            "Store replaced"
        );
        Ok(())
    }

    /// Append a record; returns its position
    pub fn append(&self, record: ViolationRecord) -> Result<usize> {
        let mut records = self.load()?;
        records.push(record);
        self.replace_all(&records)?;
        Ok(records.len() - 1)
    }

    /// Replace the record at `position`; returns the previous record
    pub fn update_at(&self, position: usize, record: ViolationRecord) -> Result<ViolationRecord> {
        let mut records = self.load()?;
        let len = records.len();
        let slot = records
            .get_mut(position)
            .ok_or(Error::PositionOutOfRange { position, len })?;
        let previous = std::mem::replace(slot, record);
        self.replace_all(&records)?;
        Ok(previous)
    }

    /// Remove the record at `position`; later positions shift down by one
    pub fn delete_at(&self, position: usize) -> Result<ViolationRecord> {
        let mut records = self.load()?;
        if position >= records.len() {
            return Err(Error::PositionOutOfRange {
                position,
                len: records.len(),
            });
        }
        let removed = records.remove(position);
        self.replace_all(&records)?;
        Ok(removed)
    }

    /// Fingerprint of the store file; `None` if it does not exist
    pub fn fingerprint(&self, mode: FingerprintMode) -> Result<Option<StoreFingerprint>> {
        Ok(StoreFingerprint::read(&self.path, mode)?)
    }

    /// Remove temporary files left by writers that died before renaming
    ///
    /// Must only be called while holding exclusive access: a temporary file
    /// belonging to a live writer looks exactly like an abandoned one.
    pub fn cleanup_temp_files(&self) -> Result<usize> {
        let dir = self.dir();
        if !dir.exists() {
            return Ok(0);
        }

        let prefix = self.temp_prefix();
        let mut count = 0;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) && name.ends_with(TEMP_SUFFIX) {
                warn!(path = %entry.path().display(), "Removing abandoned temp file");
                fs::remove_file(entry.path())?;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
