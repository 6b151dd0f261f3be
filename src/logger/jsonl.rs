//! JSONL activity log: append-only line-delimited JSON.
//!
//! Each line is a self-contained JSON object, assembled in memory and written
//! with a single `write_all` so tailing processes never see partial lines.
//! Degradation chain: primary file, then stderr with an `[FSN-LOG]` prefix,
//! then silent discard — logging must never take the scanner down.

#![allow(missing_docs)]

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Log event types matching the fsn activity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    FolderAdded,
    FolderRemoved,
    ThresholdUpdated,
    ScanStarted,
    FolderScanned,
    ScanComplete,
    ScanRejected,
    ScheduledCheckSkipped,
    NotificationSent,
    DaemonStart,
    DaemonStop,
    Error,
}

/// A single JSONL log entry — all fields optional except `ts`, `event`,
/// `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Event type identifier.
    pub event: EventType,
    /// Severity level.
    pub severity: Severity,
    /// Affected folder path (when applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Measured size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Threshold in bytes at the time of the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
    /// Threshold verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceeded: Option<bool>,
    /// Duration of the operation in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// FSN error code if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event,
            severity,
            path: None,
            size: None,
            threshold: None,
            exceeded: None,
            duration_ms: None,
            error_code: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.display().to_string());
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn with_exceeded(mut self, exceeded: bool) -> Self {
        self.exceeded = Some(exceeded);
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Degradation state of the log writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Writing to the log file.
    Normal,
    /// File failed, writing to stderr.
    Stderr,
    /// Logging disabled, silently discarding.
    Discard,
}

struct Inner {
    writer: Option<BufWriter<File>>,
    state: WriterState,
}

/// Shared append-only activity log. Cheap to clone behind an `Arc` and safe
/// to call from the scan worker and the foreground at once.
pub struct ActivityLog {
    inner: Mutex<Inner>,
}

impl ActivityLog {
    /// Open the activity log at `path`, creating parent directories. On
    /// failure the log degrades to stderr.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                inner: Mutex::new(Inner {
                    writer: Some(BufWriter::with_capacity(16 * 1024, file)),
                    state: WriterState::Normal,
                }),
            },
            Err(e) => {
                eprintln!(
                    "[FSN-LOG] cannot open {} ({e}), logging to stderr",
                    path.display()
                );
                Self {
                    inner: Mutex::new(Inner {
                        writer: None,
                        state: WriterState::Stderr,
                    }),
                }
            }
        }
    }

    /// Create a disabled log that discards everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            inner: Mutex::new(Inner {
                writer: None,
                state: WriterState::Discard,
            }),
        }
    }

    /// Write a single entry as one atomic JSONL line.
    pub fn append(&self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[FSN-LOG] serialize error: {e}");
                return;
            }
        };

        let mut inner = self.inner.lock();
        match inner.state {
            WriterState::Normal => {
                let failed = match inner.writer.as_mut() {
                    Some(w) => w.write_all(line.as_bytes()).is_err() || w.flush().is_err(),
                    None => true,
                };
                if failed {
                    inner.state = WriterState::Stderr;
                    inner.writer = None;
                    let _ = write!(io::stderr(), "[FSN-LOG] {line}");
                }
            }
            WriterState::Stderr => {
                let _ = write!(io::stderr(), "[FSN-LOG] {line}");
            }
            WriterState::Discard => {}
        }
    }

    /// Current degradation state, for status output.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.inner.lock().state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }
}
