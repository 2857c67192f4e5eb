//! Cheap change detection for the store file
//!
//! A fingerprint is compared, never interpreted. Two equal fingerprints mean
//! "probably unchanged"; any difference triggers a full reload.
//!
//! Every write replaces the file through a rename, so the inode changes on
//! each commit (unix). That catches rewrites that keep the same length within
//! one mtime tick. `Content` mode additionally hashes the bytes, for
//! filesystems with coarse timestamps and no stable inode numbers.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use xxhash_rust::xxh3::xxh3_64;

/// How much of the file goes into a fingerprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// Length, modification time, inode
    #[default]
    Metadata,
    /// Metadata plus an xxh3 hash of the content
    Content,
}

/// Observed identity of the store file at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFingerprint {
    len: u64,
    modified: Option<SystemTime>,
    inode: Option<u64>,
    content_hash: Option<u64>,
}

impl StoreFingerprint {
    /// Fingerprint `path`; `None` if the file does not exist
    pub fn read(path: &Path, mode: FingerprintMode) -> io::Result<Option<Self>> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let content_hash = match mode {
            FingerprintMode::Metadata => None,
            FingerprintMode::Content => match fs::read(path) {
                Ok(bytes) => Some(xxh3_64(&bytes)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e),
            },
        };

        Ok(Some(StoreFingerprint {
            len: meta.len(),
            modified: meta.modified().ok(),
            inode: inode(&meta),
            content_hash,
        }))
    }

    /// File length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file was empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(unix)]
fn inode(meta: &fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn inode(_meta: &fs::Metadata) -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let fp = StoreFingerprint::read(&dir.path().join("none.csv"), FingerprintMode::Metadata).unwrap();
        assert!(fp.is_none());
    }

    #[test]
    fn test_stable_when_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v.csv");
        fs::write(&path, "abc").unwrap();
        for mode in [FingerprintMode::Metadata, FingerprintMode::Content] {
            let a = StoreFingerprint::read(&path, mode).unwrap();
            let b = StoreFingerprint::read(&path, mode).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.unwrap().len(), 3);
        }
    }

    #[test]
    fn test_rename_changes_fingerprint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v.csv");
        fs::write(&path, "abc").unwrap();
        let before = StoreFingerprint::read(&path, FingerprintMode::Metadata).unwrap();

        // Same length, replaced by rename as the store does
        let tmp = dir.path().join("v.csv.tmp");
        fs::write(&tmp, "xyz").unwrap();
        fs::rename(&tmp, &path).unwrap();

        let after = StoreFingerprint::read(&path, FingerprintMode::Metadata).unwrap();
        if cfg!(unix) {
            assert_ne!(before, after);
        }
    }

    #[test]
    fn test_content_mode_sees_same_length_edit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v.csv");
        fs::write(&path, "abc").unwrap();
        let before = StoreFingerprint::read(&path, FingerprintMode::Content).unwrap();
        fs::write(&path, "abd").unwrap();
        let after = StoreFingerprint::read(&path, FingerprintMode::Content).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: FingerprintMode,
        }
        let w: Wrapper = serde_json::from_str(r#"{"mode":"content"}"#).unwrap();
        assert_eq!(w.mode, FingerprintMode::Content);
    }
}
