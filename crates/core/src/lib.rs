//! Core types for the Vigil violation store
//!
//! This crate defines the foundational types used throughout the system:
//! - RecordId: surrogate key for a violation record
//! - ViolationTimestamp: the fixed `MM/DD/YY HH:MM AM/PM` timestamp
//! - ViolationRecord: the violation entity and its row form
//! - RecordDraft / RecordPatch: validated create and update inputs
//! - RecordFilter / SortOrder: listing filters and display ordering
//! - ViolationStats: summary counts
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod record;
pub mod stats;
pub mod timestamp;
pub mod types;

pub use error::{Error, Result, ValidationError};
pub use filter::{PositionedRecord, RecordFilter, SortOrder};
pub use record::{RecordDraft, RecordPatch, ViolationRecord, COLUMNS, LEGACY_COLUMN_COUNT};
pub use stats::ViolationStats;
pub use timestamp::{ViolationTimestamp, TIMESTAMP_FORMAT};
pub use types::RecordId;
