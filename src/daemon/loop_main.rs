//! Daemon loop: sleep in short slices, poll signals, fire the daily silent
//! check when its tick arrives (or immediately on SIGUSR1), reschedule for
//! the next day.
//!
//! The loop itself never walks the filesystem — it only triggers the
//! coordinator, which dispatches the walk to its background worker. Waiting
//! for the handle here keeps at most one daemon-triggered scan alive and
//! gives the activity log a clean start/complete pairing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::daemon::schedule;
use crate::daemon::signals::SignalHandler;
use crate::engine::ScanCoordinator;
use crate::logger::{ActivityLog, EventType, LogEntry, Severity};

/// Run the daemon loop until a shutdown signal arrives.
pub fn run(
    config: &Config,
    coordinator: &ScanCoordinator,
    log: &Arc<ActivityLog>,
    signals: &SignalHandler,
) -> Result<()> {
    let check_time = config.schedule.parsed_check_time()?;
    let poll = Duration::from_secs(config.schedule.poll_interval_secs);

    log.append(
        &LogEntry::new(EventType::DaemonStart, Severity::Info).with_details(format!(
            "daily check at {}, schedule {}",
            config.schedule.check_time,
            if config.schedule.enabled {
                "enabled"
            } else {
                "disabled"
            }
        )),
    );

    let mut next_tick = schedule::next_tick(Local::now().naive_local(), check_time);

    while !signals.should_shutdown() {
        let tick_due =
            config.schedule.enabled && Local::now().naive_local() >= next_tick;

        if tick_due || signals.should_check_now() {
            fire_scheduled_check(coordinator, log);
            next_tick = schedule::next_tick(Local::now().naive_local(), check_time);
        }

        // Sleep the poll interval, but never past the next tick.
        let until_tick = schedule::delay_until_next(Local::now().naive_local(), check_time);
        std::thread::sleep(poll.min(until_tick).max(Duration::from_millis(100)));
    }

    log.append(&LogEntry::new(EventType::DaemonStop, Severity::Info).with_details("shutdown"));
    Ok(())
}

fn fire_scheduled_check(coordinator: &ScanCoordinator, log: &Arc<ActivityLog>) {
    match coordinator.scheduled_check(Local::now().date_naive()) {
        Ok(Some(handle)) => {
            // Block until the worker finishes; overlap is impossible anyway
            // and the next tick is a day away.
            if let Err(e) = handle.wait() {
                let mut entry = LogEntry::new(EventType::Error, Severity::Warning);
                entry.error_code = Some(e.code().to_string());
                entry.details = Some(e.to_string());
                log.append(&entry);
            }
        }
        Ok(None) => {
            // Already notified today; the coordinator logged the skip.
        }
        Err(e) if e.is_busy() => {
            log.append(
                &LogEntry::new(EventType::ScheduledCheckSkipped, Severity::Info)
                    .with_details("scan in progress"),
            );
        }
        Err(e) => {
            let mut entry = LogEntry::new(EventType::Error, Severity::Warning);
            entry.error_code = Some(e.code().to_string());
            entry.details = Some(e.to_string());
            log.append(&entry);
        }
    }
}
