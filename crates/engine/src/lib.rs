//! Engine for Vigil
//!
//! Ties the lower layers together into the two interfaces other programs
//! use:
//! - ViolationStore: the editing client (list, create, update, delete)
//! - ChangeMonitor: the notification sink (per-record change events)
//!
//! plus the `vigil.toml` configuration both are opened from.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod index;
pub mod monitor;
pub mod store;

pub use config::{LockSettings, MonitorSettings, StoreSettings, VigilConfig, CONFIG_FILE_NAME};
pub use index::RecordIndex;
pub use monitor::{
    diff_records, ChangeEvent, ChangeKind, ChangeMonitor, MonitorHandle, MonitorState,
};
pub use store::ViolationStore;
