//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use folder_sentinel::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{FsnError, Result};

// Engine
pub use crate::engine::coordinator::{ScanCoordinator, ScanHandle};
pub use crate::engine::report::{BatchReport, FolderOutcome, ScanResult, format_bytes};
pub use crate::engine::threshold::{Verdict, evaluate};

// Scanner
pub use crate::scanner::sizer::{DEFAULT_MAX_DEPTH, Measurement, compute_size, measure};

// Store
pub use crate::store::{ConfigStore, DEFAULT_THRESHOLD_MB, JsonStore, MemoryStore};

// Notifications
pub use crate::notify::{Notification, NotificationManager, NotificationSink};

// Logging
pub use crate::logger::{ActivityLog, EventType, LogEntry, Severity};
