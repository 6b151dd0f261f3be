//! Scan orchestration: the Idle/Scanning state machine.
//!
//! The coordinator owns the single in-flight scan slot. A scan request that
//! arrives while another scan is running is rejected immediately — never
//! queued, never merged. Walks run on a background worker thread so no caller
//! is ever blocked on filesystem I/O; the returned [`ScanHandle`] lets the
//! caller stream per-folder outcomes or wait for the aggregate report.
//!
//! Three operation modes share the state machine: a single-folder check that
//! always reports its result, an interactive batch over every monitored
//! folder, and the scheduled silent check that stays quiet unless a threshold
//! is exceeded and at most once per calendar day.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use chrono::NaiveDate;
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::core::errors::{FsnError, Result};
use crate::core::paths;
use crate::engine::report::{BatchReport, FolderOutcome, ScanResult};
use crate::engine::threshold;
use crate::logger::{ActivityLog, EventType, LogEntry, Severity};
use crate::notify::{Notification, NotificationSink};
use crate::scanner::sizer;
use crate::store::{ConfigStore, DEFAULT_THRESHOLD_MB};

// ──────────────────── scan slot ────────────────────

/// Exclusive ownership of the single in-flight scan. Dropping the slot
/// returns the coordinator to Idle unconditionally — including when the
/// worker unwinds from a panic.
struct ScanSlot {
    flag: Arc<AtomicBool>,
}

impl ScanSlot {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for ScanSlot {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ──────────────────── scan handle ────────────────────

/// Handle to an in-flight scan. The caller decides how to observe it:
/// iterate [`events`](Self::events) for per-folder outcomes as they complete,
/// or [`wait`](Self::wait) for the aggregate report.
pub struct ScanHandle {
    events: Receiver<FolderOutcome>,
    join: thread::JoinHandle<BatchReport>,
}

impl ScanHandle {
    /// Per-folder outcomes, delivered in monitored-folder order.
    #[must_use]
    pub fn events(&self) -> &Receiver<FolderOutcome> {
        &self.events
    }

    /// Block until the scan completes and return the aggregate report.
    pub fn wait(self) -> Result<BatchReport> {
        self.join.join().map_err(|_| FsnError::Runtime {
            details: "scan worker panicked".to_string(),
        })
    }

    /// Whether the background worker has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

// ──────────────────── coordinator ────────────────────

/// Orchestrates folder scans against the configured store and notification
/// sink. All state beyond the injected collaborators is the single
/// in-progress flag.
pub struct ScanCoordinator {
    store: Arc<dyn ConfigStore>,
    sink: Arc<dyn NotificationSink>,
    log: Arc<ActivityLog>,
    max_depth: usize,
    scanning: Arc<AtomicBool>,
}

impl ScanCoordinator {
    /// Build a coordinator. `max_depth` bounds every walk this coordinator
    /// performs.
    #[must_use]
    pub fn new(
        store: Arc<dyn ConfigStore>,
        sink: Arc<dyn NotificationSink>,
        log: Arc<ActivityLog>,
        max_depth: usize,
    ) -> Self {
        Self {
            store,
            sink,
            log,
            max_depth,
            scanning: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a scan is currently in flight.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Check one folder and always report its size, whatever the verdict.
    ///
    /// Rejects with [`FsnError::ScanInProgress`] when a scan is already
    /// running. A missing root is reported as [`FsnError::FolderNotFound`]
    /// without entering the walk; Idle is restored immediately.
    pub fn check_folder(&self, path: &Path) -> Result<ScanHandle> {
        let slot = self.acquire_slot()?;

        let resolved = paths::resolve_monitored_path(path);
        if !resolved.exists() {
            // Slot drops on return: not an in-flight failure, just a no-op.
            self.log.append(
                &LogEntry::new(EventType::ScanRejected, Severity::Warning)
                    .with_path(&resolved)
                    .with_details("folder not found"),
            );
            return Err(FsnError::FolderNotFound { path: resolved });
        }

        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.sink);
        let log = Arc::clone(&self.log);
        let max_depth = self.max_depth;
        let (tx, rx) = unbounded();

        let join = thread::spawn(move || {
            let _slot = slot;
            let outcome = scan_folder(store.as_ref(), &log, resolved, max_depth);
            if let FolderOutcome::Scanned(result) = &outcome {
                sink.send(&Notification::new(
                    "Folder Size",
                    result.to_string(),
                    format!("size-{}", result.name),
                ));
            }
            let _ = tx.send(outcome.clone());
            BatchReport {
                outcomes: vec![outcome],
            }
        });

        Ok(ScanHandle { events: rx, join })
    }

    /// Walk every monitored folder and report on all of them together.
    ///
    /// Always produces a notification covering each folder's OK/EXCEEDS
    /// status (unless no folders are configured). When any folder exceeds,
    /// the last-notified date is set to `today` so the scheduled check does
    /// not re-alert the same day.
    pub fn check_all(&self, today: NaiveDate) -> Result<ScanHandle> {
        let slot = self.acquire_slot()?;
        let folders = self.store.folders()?;

        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.sink);
        let log = Arc::clone(&self.log);
        let max_depth = self.max_depth;
        let (tx, rx) = unbounded();

        let join = thread::spawn(move || {
            let _slot = slot;
            let started = Instant::now();
            let report = walk_batch(store.as_ref(), &log, &folders, max_depth, &tx);

            if !report.outcomes.is_empty() {
                let notification = if report.any_exceeded() {
                    if let Err(e) = store.set_last_notified(today) {
                        log_store_error(&log, &e);
                    }
                    Notification::new(
                        "Size Threshold Exceeded",
                        report.status_body(),
                        "size-check-all",
                    )
                } else {
                    Notification::new(
                        "All Folders Under Threshold",
                        report.usage_body(),
                        "size-check-all",
                    )
                };
                sink.send(&notification);
                log.append(
                    &LogEntry::new(EventType::NotificationSent, Severity::Info)
                        .with_details(notification.title.clone()),
                );
            }

            log_batch_complete(&log, &report, started);
            report
        });

        Ok(ScanHandle { events: rx, join })
    }

    /// The daily silent check: walk every monitored folder, but notify only
    /// when at least one folder exceeds, and at most once per calendar day.
    ///
    /// Returns `Ok(None)` when the check is suppressed because an exceeded
    /// notification already went out on `today`.
    pub fn scheduled_check(&self, today: NaiveDate) -> Result<Option<ScanHandle>> {
        let slot = self.acquire_slot()?;

        if self.store.last_notified()? == Some(today) {
            // Already notified today; slot drops on return.
            self.log.append(
                &LogEntry::new(EventType::ScheduledCheckSkipped, Severity::Info)
                    .with_details(format!("already notified on {today}")),
            );
            return Ok(None);
        }

        let folders = self.store.folders()?;

        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.sink);
        let log = Arc::clone(&self.log);
        let max_depth = self.max_depth;
        let (tx, rx) = unbounded();

        let join = thread::spawn(move || {
            let _slot = slot;
            let started = Instant::now();
            let report = walk_batch(store.as_ref(), &log, &folders, max_depth, &tx);

            // No all-clear in this mode: silence is the normal outcome.
            if report.any_exceeded() {
                let body = format!(
                    "The following folders exceed their thresholds:\n\n{}",
                    report.exceeded_body()
                );
                let notification =
                    Notification::new("Folder Size Alert", body, "threshold-exceeded");
                sink.send(&notification);
                if let Err(e) = store.set_last_notified(today) {
                    log_store_error(&log, &e);
                }
                log.append(
                    &LogEntry::new(EventType::NotificationSent, Severity::Warning)
                        .with_details(notification.title.clone()),
                );
            }

            log_batch_complete(&log, &report, started);
            report
        });

        Ok(Some(ScanHandle { events: rx, join }))
    }

    fn acquire_slot(&self) -> Result<ScanSlot> {
        ScanSlot::try_acquire(&self.scanning).ok_or_else(|| {
            self.log
                .append(&LogEntry::new(EventType::ScanRejected, Severity::Info));
            FsnError::ScanInProgress
        })
    }
}

// ──────────────────── worker internals ────────────────────

/// Walk a list of folders sequentially in the given order, streaming each
/// outcome as it completes.
fn walk_batch(
    store: &dyn ConfigStore,
    log: &ActivityLog,
    folders: &[PathBuf],
    max_depth: usize,
    tx: &Sender<FolderOutcome>,
) -> BatchReport {
    log.append(
        &LogEntry::new(EventType::ScanStarted, Severity::Info)
            .with_details(format!("{} folders", folders.len())),
    );

    let mut outcomes = Vec::with_capacity(folders.len());
    for folder in folders {
        let outcome = scan_folder(store, log, folder.clone(), max_depth);
        let _ = tx.send(outcome.clone());
        outcomes.push(outcome);
    }

    BatchReport { outcomes }
}

/// Walk one folder: measure, evaluate, persist the verdict.
///
/// A root missing at scan start skips the walk entirely and leaves the
/// folder's last-known exceeded status untouched.
fn scan_folder(
    store: &dyn ConfigStore,
    log: &ActivityLog,
    path: PathBuf,
    max_depth: usize,
) -> FolderOutcome {
    let name = paths::display_name(&path);

    if !path.exists() {
        log.append(
            &LogEntry::new(EventType::FolderScanned, Severity::Warning)
                .with_path(&path)
                .with_details("folder not found"),
        );
        return FolderOutcome::NotFound { path, name };
    }

    let started = Instant::now();
    let measurement = sizer::measure(&path, max_depth);
    let threshold_mb = store.threshold_mb(&path).unwrap_or(DEFAULT_THRESHOLD_MB);
    let verdict = threshold::evaluate(measurement.bytes, threshold_mb);

    // Persist the verdict for monitored folders only; an ad-hoc check of an
    // arbitrary path must not plant orphan status entries.
    let monitored = store
        .folders()
        .map(|folders| folders.iter().any(|f| f == &path))
        .unwrap_or(false);
    if monitored {
        if let Err(e) = store.set_exceeded(&path, verdict.exceeded) {
            log_store_error(log, &e);
        }
    }

    let mut entry = LogEntry::new(EventType::FolderScanned, Severity::Info)
        .with_path(&path)
        .with_size(measurement.bytes)
        .with_threshold(verdict.threshold_bytes)
        .with_exceeded(verdict.exceeded)
        .with_duration_ms(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
    if !measurement.skipped.is_empty() {
        entry = entry.with_details(format!("{} unreadable entries", measurement.skipped.len()));
    }
    log.append(&entry);

    FolderOutcome::Scanned(ScanResult {
        path,
        name,
        size_bytes: measurement.bytes,
        threshold_bytes: verdict.threshold_bytes,
        exceeded: verdict.exceeded,
    })
}

fn log_batch_complete(log: &ActivityLog, report: &BatchReport, started: Instant) {
    log.append(
        &LogEntry::new(EventType::ScanComplete, Severity::Info)
            .with_exceeded(report.any_exceeded())
            .with_duration_ms(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)),
    );
}

fn log_store_error(log: &ActivityLog, error: &FsnError) {
    let mut entry = LogEntry::new(EventType::Error, Severity::Warning);
    entry.error_code = Some(error.code().to_string());
    entry.details = Some(error.to_string());
    log.append(&entry);
}

// ──────────────────── tests ────────────────────
