//! The scan engine: threshold evaluation, result reporting, and the
//! Idle/Scanning coordinator.

pub mod coordinator;
pub mod report;
pub mod threshold;

pub use coordinator::{ScanCoordinator, ScanHandle};
pub use report::{BatchReport, FolderOutcome, ScanResult, format_bytes};
pub use threshold::{BYTES_PER_MB, Verdict, evaluate};
