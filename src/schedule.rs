use std::thread;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{error, info};

/// Longest single sleep; the deadline is re-checked after each one.
const MAX_NAP: Duration = Duration::from_secs(3600);

/// First instant (00:00:00 UTC) of the month after `now`.
pub fn next_month_start(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (year, month) = match now.month() {
        12 => (now.year() + 1, 1),
        month => (now.year(), month + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Calls `job` at the start of every month, forever.
pub fn run_monthly<F: FnMut()>(mut job: F) {
    loop {
        let Some(deadline) = next_month_start(Utc::now()) else {
            error!("could not compute next month start; scheduler stopped");
            return;
        };
        info!(next_run = %deadline.to_rfc3339(), "waiting for next scheduled run");
        sleep_until(deadline);
        info!(trigger = "schedule", "run requested");
        job();
    }
}

fn sleep_until(deadline: DateTime<Utc>) {
    loop {
        let remaining = match (deadline - Utc::now()).to_std() {
            Ok(remaining) if !remaining.is_zero() => remaining,
            _ => return,
        };
        thread::sleep(remaining.min(MAX_NAP));
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn next_start_mid_month() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap();
        let next = next_month_start(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn next_start_rolls_year() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
        let next = next_month_start(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn next_start_from_exact_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();
        let next = next_month_start(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
    }
}
