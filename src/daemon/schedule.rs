//! Daily tick computation for the scheduled silent check.

use chrono::{NaiveDateTime, NaiveTime};

/// Next occurrence of `check_time` strictly after the current instant.
///
/// If `now` is at or past today's check time, the tick moves to tomorrow —
/// a check that already fired today must not fire again.
#[must_use]
pub fn next_tick(now: NaiveDateTime, check_time: NaiveTime) -> NaiveDateTime {
    let today_target = now.date().and_time(check_time);
    if now < today_target {
        today_target
    } else {
        today_target + chrono::Duration::days(1)
    }
}

/// Duration from `now` until the next tick, for sleep-based scheduling.
#[must_use]
pub fn delay_until_next(now: NaiveDateTime, check_time: NaiveTime) -> std::time::Duration {
    (next_tick(now, check_time) - now)
        .to_std()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn dt(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn check_time() -> NaiveTime {
        NaiveTime::from_hms_opt(16, 10, 0).unwrap()
    }

    #[test]
    fn before_check_time_ticks_today() {
        let tick = next_tick(dt(9, 0, 0), check_time());
        assert_eq!(tick.date(), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(tick.hour(), 16);
        assert_eq!(tick.minute(), 10);
    }

    #[test]
    fn exactly_at_check_time_ticks_tomorrow() {
        let tick = next_tick(dt(16, 10, 0), check_time());
        assert_eq!(tick.date(), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }

    #[test]
    fn after_check_time_ticks_tomorrow() {
        let tick = next_tick(dt(23, 59, 59), check_time());
        assert_eq!(tick.date(), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }

    #[test]
    fn delay_matches_tick_distance() {
        let delay = delay_until_next(dt(16, 0, 0), check_time());
        assert_eq!(delay, std::time::Duration::from_secs(600));
    }

    #[test]
    fn delay_is_never_more_than_a_day() {
        let delay = delay_until_next(dt(16, 10, 1), check_time());
        assert!(delay < std::time::Duration::from_secs(24 * 3600));
        assert!(delay > std::time::Duration::from_secs(23 * 3600));
    }
}
