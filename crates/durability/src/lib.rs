//! Durability layer for Vigil
//!
//! This crate handles everything that touches the store file:
//!
//! - Delimited-text row codec and the store table layout
//! - AtomicStore: load, and crash-safe whole-file replacement
//!   (write-fsync-rename) with load → mutate → replace single-record ops
//! - Fingerprints for cheap change detection
//! - Cleanup of temporary files abandoned by crashed writers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fingerprint; // Change detection fingerprints
pub mod format; // Row codec and table layout
pub mod store; // AtomicStore

pub use fingerprint::{FingerprintMode, StoreFingerprint};
pub use format::{decode_table, encode_table, TableError};
pub use store::AtomicStore;
