//! Vigil Comprehensive Test Suite
//!
//! End-to-end coverage through the public `vigil` facade:
//!
//! - `scenario`: the editing-client lifecycle
//! - `concurrency`: many editors on one store
//! - `monitor`: change detection completeness
//! - `durability`: what survives interrupted and hand-edited files
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test vigil_comprehensive
//! cargo test --test vigil_comprehensive monitor::
//! cargo test --test vigil_comprehensive -- --nocapture
//! ```

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod durability;
mod monitor;
mod scenario;
