//! Error types for the violation store
//!
//! Two levels:
//! - [`ValidationError`]: a single field or row was rejected. Recovered at the
//!   boundary; the store is never touched.
//! - [`Error`]: everything an operation on the store can fail with.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::RecordId;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// A record or one of its fields failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Timestamp does not match `MM/DD/YY HH:MM AM/PM`
    #[error("malformed timestamp {value:?}: expected MM/DD/YY HH:MM AM/PM")]
    MalformedTimestamp {
        /// Offending text
        value: String,
    },

    /// A required field is empty
    #[error("missing required field `{field}`")]
    MissingField {
        /// Column name
        field: &'static str,
    },

    /// Boolean column holds something other than True/False
    #[error("malformed flag `{field}` = {value:?}: expected True or False")]
    MalformedFlag {
        /// Column name
        field: &'static str,
        /// Offending text
        value: String,
    },

    /// Record id column is not a UUID
    #[error("malformed record id {value:?}")]
    MalformedId {
        /// Offending text
        value: String,
    },

    /// Row has the wrong number of columns
    #[error("expected {expected} columns, found {found}")]
    ColumnCount {
        /// Columns required
        expected: usize,
        /// Columns present
        found: usize,
    },
}

/// Error types for the violation store
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before reaching the store
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The store file exists but could not be parsed
    #[error("store {} is corrupt at line {line}: {reason}", path.display())]
    StoreCorrupt {
        /// Store file
        path: PathBuf,
        /// 1-based line of the offending row
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// A write step before the atomic rename failed; the store is unchanged
    #[error("write to {} failed, store left unchanged: {source}", path.display())]
    StoreWriteFailed {
        /// Store file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// Exclusive access was not granted in time; nothing was written
    #[error("timed out after {waited:?} waiting for lock {}", path.display())]
    LockTimeout {
        /// Sentinel lock file
        path: PathBuf,
        /// Time spent waiting
        waited: Duration,
    },

    /// Position does not address a record
    #[error("position {position} out of range (store holds {len} records)")]
    PositionOutOfRange {
        /// Requested position
        position: usize,
        /// Number of records at the time of the request
        len: usize,
    },

    /// No record carries this id
    #[error("record {0} not found")]
    RecordNotFound(RecordId),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error outside the write protocol (reads, lock file, metadata)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Build a `StoreCorrupt` error
    pub fn corrupt(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Error::StoreCorrupt {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Build a `StoreWriteFailed` error
    pub fn write_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::StoreWriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Build a `Config` error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether retrying the same call may succeed
    ///
    /// Only lock timeouts qualify: validation and corruption fail the same
    /// way every time until a human intervenes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LockTimeout { .. })
    }
}
