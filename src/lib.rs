//! Vigil - shared record store for CCTV safety violations
//!
//! Detectors, dashboards and chat bots in separate processes all read and
//! edit one delimited-text file. Vigil keeps that file consistent:
//!
//! - every write replaces the whole file atomically (write, fsync, rename),
//!   so readers never see a torn file
//! - every mutation runs under a cross-process lock, so concurrent editors
//!   never lose each other's changes
//! - a change monitor turns rewrites into per-record Added / Modified /
//!   Removed events for notification sinks
//!
//! # Quick Start
//!
//! ```no_run
//! use vigil::{RecordDraft, RecordFilter, RecordPatch, VigilConfig, ViolationStore};
//!
//! # fn main() -> vigil::Result<()> {
//! let store = ViolationStore::open(VigilConfig::default().with_store_path("violations.csv"))?;
//!
//! let created = store.create(&RecordDraft::new("01/02/24 09:15 AM", "A1", "S3", "NoHelmet"))?;
//! store.update(created.position, &RecordPatch::resolve())?;
//!
//! for entry in store.list(&RecordFilter::unresolved())? {
//!     println!("{} {}", entry.position, entry.record.violation_type());
//! }
//!
//! let mut monitor = store.monitor()?;
//! for event in monitor.poll_once()? {
//!     if event.is_new_alert() {
//!         println!("new violation at #{}", event.position);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub use vigil_concurrency::{AccessCoordinator, ExclusiveGuard, LockConfig};
pub use vigil_core::*;
pub use vigil_durability::{AtomicStore, FingerprintMode, StoreFingerprint};
pub use vigil_engine::*;
