//! Pure calendar and countdown helpers for the booking lifecycle
//!
//! Every function takes the current instant as an explicit argument so the
//! engine passes `Utc::now()` and tests control the clock. Day boundaries are
//! computed in UTC; booking dates are calendar dates anchored at midnight.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Last instant of the given calendar date (23:59:59.999 UTC).
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .expect("23:59:59.999 is a valid time of day")
        .and_utc()
}

/// First instant of the given calendar date (00:00:00 UTC).
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time of day")
        .and_utc()
}

/// Countdown to a rental's end-of-day boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRemaining {
    pub expired: bool,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

/// How long until the rental's end date is over, relative to `now`.
///
/// A rental counts as expired strictly after the last instant of its end
/// date, never before.
pub fn time_remaining(end_date: NaiveDate, now: DateTime<Utc>) -> TimeRemaining {
    let deadline = end_of_day(end_date);
    if now > deadline {
        return TimeRemaining {
            expired: true,
            days: 0,
            hours: 0,
            minutes: 0,
        };
    }

    let left = deadline - now;
    TimeRemaining {
        expired: false,
        days: left.num_days(),
        hours: left.num_hours() % 24,
        minutes: left.num_minutes() % 60,
    }
}

/// Elapsed fraction of the rental period `[start_date, end-of-day(end_date)]`
/// as a percentage clamped to `0.0..=100.0`.
pub fn expiration_percentage(
    start_date: NaiveDate,
    end_date: NaiveDate,
    now: DateTime<Utc>,
) -> f64 {
    let start = start_of_day(start_date);
    let end = end_of_day(end_date);

    if now <= start {
        return 0.0;
    }
    if now >= end {
        return 100.0;
    }

    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return 100.0;
    }
    let elapsed = (now - start).num_milliseconds();

    (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Countdown to the owner-response deadline of a pending booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingTimeout {
    pub timeout_at: DateTime<Utc>,
    pub hours_remaining: i64,
    pub minutes_remaining: i64,
    pub is_expired: bool,
}

/// Deadline and remaining time for a request created at `created_at` with a
/// `response_hours` owner-response window.
pub fn pending_timeout_info(
    created_at: DateTime<Utc>,
    response_hours: i64,
    now: DateTime<Utc>,
) -> PendingTimeout {
    let timeout_at = created_at + Duration::hours(response_hours);

    if now >= timeout_at {
        return PendingTimeout {
            timeout_at,
            hours_remaining: 0,
            minutes_remaining: 0,
            is_expired: true,
        };
    }

    let left = timeout_at - now;
    PendingTimeout {
        timeout_at,
        hours_remaining: left.num_hours(),
        minutes_remaining: left.num_minutes() % 60,
        is_expired: false,
    }
}

/// Hours left until the response deadline, rounded to the nearest hour.
/// Used for the owner reminder countdown copy.
pub fn rounded_hours_until_timeout(
    created_at: DateTime<Utc>,
    response_hours: i64,
    now: DateTime<Utc>,
) -> i64 {
    let timeout_at = created_at + Duration::hours(response_hours);
    let minutes = (timeout_at - now).num_minutes();
    if minutes <= 0 {
        return 0;
    }
    ((minutes as f64) / 60.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instant(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_time_remaining_before_deadline() {
        // Noon on the end date: 11h 59m of the day left.
        let left = time_remaining(date(2026, 3, 10), instant(2026, 3, 10, 12, 0));
        assert!(!left.expired);
        assert_eq!(left.days, 0);
        assert_eq!(left.hours, 11);
        assert_eq!(left.minutes, 59);
    }

    #[test]
    fn test_time_remaining_multi_day() {
        let left = time_remaining(date(2026, 3, 12), instant(2026, 3, 10, 0, 0));
        assert!(!left.expired);
        assert_eq!(left.days, 2);
    }

    #[test]
    fn test_time_remaining_expired_exactly_after_end_of_day() {
        let end = date(2026, 3, 10);

        // Last millisecond of the day is still not expired.
        let at_boundary = time_remaining(end, end_of_day(end));
        assert!(!at_boundary.expired);

        let after = time_remaining(end, instant(2026, 3, 11, 0, 0));
        assert!(after.expired);
        assert_eq!(after.days, 0);
        assert_eq!(after.minutes, 0);
    }

    #[test]
    fn test_expiration_percentage_boundaries() {
        let start = date(2026, 3, 10);
        let end = date(2026, 3, 12);

        assert_eq!(
            expiration_percentage(start, end, instant(2026, 3, 9, 12, 0)),
            0.0
        );
        assert_eq!(
            expiration_percentage(start, end, start_of_day(start)),
            0.0
        );
        assert_eq!(
            expiration_percentage(start, end, instant(2026, 3, 13, 0, 0)),
            100.0
        );
    }

    #[test]
    fn test_expiration_percentage_monotone() {
        let start = date(2026, 3, 10);
        let end = date(2026, 3, 12);

        let mut prev = 0.0;
        for hour in (0..72).step_by(6) {
            let now = start_of_day(start) + Duration::hours(hour);
            let pct = expiration_percentage(start, end, now);
            assert!(pct >= prev, "percentage decreased at hour {hour}");
            assert!((0.0..=100.0).contains(&pct));
            prev = pct;
        }
    }

    #[test]
    fn test_expiration_percentage_single_day_rental() {
        let day = date(2026, 3, 10);
        let pct = expiration_percentage(day, day, instant(2026, 3, 10, 12, 0));
        assert!(pct > 0.0 && pct < 100.0);
    }

    #[test]
    fn test_pending_timeout_info_remaining() {
        let created = instant(2026, 3, 10, 0, 0);
        let info = pending_timeout_info(created, 24, instant(2026, 3, 10, 10, 30));
        assert!(!info.is_expired);
        assert_eq!(info.timeout_at, instant(2026, 3, 11, 0, 0));
        assert_eq!(info.hours_remaining, 13);
        assert_eq!(info.minutes_remaining, 30);
    }

    #[test]
    fn test_pending_timeout_info_expired() {
        let created = instant(2026, 3, 10, 0, 0);
        let info = pending_timeout_info(created, 24, instant(2026, 3, 11, 0, 1));
        assert!(info.is_expired);
        assert_eq!(info.hours_remaining, 0);
        assert_eq!(info.minutes_remaining, 0);
    }

    #[test]
    fn test_rounded_hours_until_timeout() {
        let created = instant(2026, 3, 10, 0, 0);

        // 13h30m left rounds up to 14.
        assert_eq!(
            rounded_hours_until_timeout(created, 24, instant(2026, 3, 10, 10, 30)),
            14
        );
        // 11h10m left rounds down to 11.
        assert_eq!(
            rounded_hours_until_timeout(created, 24, instant(2026, 3, 10, 12, 50)),
            11
        );
        assert_eq!(
            rounded_hours_until_timeout(created, 24, instant(2026, 3, 12, 0, 0)),
            0
        );
    }
}
