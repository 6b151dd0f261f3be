#![forbid(unsafe_code)]

//! Folder Sentinel (fsn) — background utility that tracks the disk usage of
//! monitored folders against per-folder size thresholds.
//!
//! The engine has three moving parts:
//! 1. **Size calculator** — depth-bounded, fault-tolerant directory walker
//! 2. **Threshold evaluator** — size vs. configured megabyte limit
//! 3. **Scan coordinator** — at-most-one-scan-in-flight orchestration with
//!    single, batch, and scheduled-silent operation modes
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use folder_sentinel::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use folder_sentinel::engine::ScanCoordinator;
//! use folder_sentinel::scanner::compute_size;
//! ```

pub mod prelude;

pub mod core;
#[cfg(feature = "daemon")]
pub mod daemon;
pub mod engine;
pub mod logger;
pub mod notify;
pub mod scanner;
pub mod store;
