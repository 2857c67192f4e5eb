//! Cross-process coordination for the shared record store
//!
//! Every process that mutates the store (CLI invocations, the dashboard,
//! background detectors) goes through an [`AccessCoordinator`] so that its
//! load → mutate → replace cycle never interleaves with another's.
//!
//! Reads do not take the lock; the store's atomic replace already
//! guarantees they see a complete file.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lock;

pub use lock::{AccessCoordinator, ExclusiveGuard, HolderInfo, LockConfig, LOCK_SUFFIX};
