//! Quota windows
//!
//! Both quotas answer the same question, "how many events since `T`?", and
//! differ only in how `T` is computed:
//!
//! - [`QuotaWindow::Sliding`]: `T = now - length` (spins, rolling 12 hours)
//! - [`QuotaWindow::CalendarDay`]: `T` = local midnight of the current day
//!   (claims, reset at every local midnight)

use super::WheelError;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};

/// Window over which events are counted against a quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaWindow {
    /// Rolling window of a fixed length ending at `now`
    Sliding(TimeDelta),
    /// The calendar day containing `now`, in the given local offset
    CalendarDay(FixedOffset),
}

impl QuotaWindow {
    /// Rolling window of `hours` hours
    pub fn sliding_hours(hours: u32) -> Self {
        QuotaWindow::Sliding(TimeDelta::seconds(i64::from(hours) * 3600))
    }

    /// Calendar day for a local offset east of UTC, in minutes
    ///
    /// # Errors
    ///
    /// [`WheelError::InvalidWindow`] if the offset is outside ±24 hours.
    pub fn calendar_day(offset_minutes: i32) -> Result<Self, WheelError> {
        offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(QuotaWindow::CalendarDay)
            .ok_or_else(|| {
                WheelError::InvalidWindow(format!("UTC offset of {offset_minutes} minutes"))
            })
    }

    /// Earliest timestamp still counted at `now` (inclusive)
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            QuotaWindow::Sliding(length) => now
                .checked_sub_signed(*length)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            QuotaWindow::CalendarDay(offset) => {
                local_midnight(now.with_timezone(offset).date_naive(), offset).unwrap_or(now)
            }
        }
    }

    /// When a saturated quota frees up again
    ///
    /// `earliest` is the oldest event counted in the current window. For a
    /// sliding window a slot reopens once that event ages out; for a calendar
    /// day everything reopens at the next local midnight.
    pub fn reopens_at(&self, now: DateTime<Utc>, earliest: Option<DateTime<Utc>>) -> DateTime<Utc> {
        match self {
            QuotaWindow::Sliding(length) => earliest
                .unwrap_or(now)
                .checked_add_signed(*length)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            QuotaWindow::CalendarDay(offset) => {
                let today = now.with_timezone(offset).date_naive();
                today
                    .succ_opt()
                    .and_then(|tomorrow| local_midnight(tomorrow, offset))
                    .unwrap_or(now)
            }
        }
    }
}

fn local_midnight(day: NaiveDate, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    day.and_hms_opt(0, 0, 0)?
        .and_local_timezone(*offset)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// A limit paired with the window it applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub window: QuotaWindow,
}

impl Quota {
    pub fn new(limit: u32, window: QuotaWindow) -> Self {
        Quota { limit, window }
    }

    /// Whether `used` events already exhaust the quota
    pub fn is_exhausted(&self, used: u64) -> bool {
        used >= u64::from(self.limit)
    }

    pub fn remaining(&self, used: u64) -> u64 {
        u64::from(self.limit).saturating_sub(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_sliding_window_start() {
        let window = QuotaWindow::sliding_hours(12);
        let now = utc(2025, 3, 10, 15, 30, 0);
        assert_eq!(window.start(now), utc(2025, 3, 10, 3, 30, 0));
    }

    #[test]
    fn test_sliding_window_reopens_when_oldest_ages_out() {
        let window = QuotaWindow::sliding_hours(12);
        let now = utc(2025, 3, 10, 15, 30, 0);
        let oldest = utc(2025, 3, 10, 14, 0, 0);
        assert_eq!(window.reopens_at(now, Some(oldest)), utc(2025, 3, 11, 2, 0, 0));
        assert_eq!(window.reopens_at(now, None), utc(2025, 3, 11, 3, 30, 0));
    }

    #[test]
    fn test_huge_sliding_window_saturates() {
        let window = QuotaWindow::sliding_hours(u32::MAX);
        let now = utc(2025, 3, 10, 15, 30, 0);
        assert_eq!(window.start(now), DateTime::<Utc>::MIN_UTC);
        assert_eq!(window.reopens_at(now, None), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_calendar_day_start_utc() {
        let window = QuotaWindow::calendar_day(0).unwrap();
        let now = utc(2025, 3, 10, 23, 59, 59);
        assert_eq!(window.start(now), utc(2025, 3, 10, 0, 0, 0));
        assert_eq!(window.reopens_at(now, None), utc(2025, 3, 11, 0, 0, 0));
    }

    #[test]
    fn test_calendar_day_follows_local_offset() {
        // 01:30 UTC is still 22:30 of the previous day at -03:00
        let window = QuotaWindow::calendar_day(-180).unwrap();
        let now = utc(2025, 3, 10, 1, 30, 0);
        assert_eq!(window.start(now), utc(2025, 3, 9, 3, 0, 0));
        assert_eq!(window.reopens_at(now, None), utc(2025, 3, 10, 3, 0, 0));

        // Two seconds later across local midnight is a new day
        let before = utc(2025, 3, 10, 2, 59, 59);
        let after = utc(2025, 3, 10, 3, 0, 1);
        assert_ne!(window.start(before), window.start(after));
        assert_eq!(window.start(after), utc(2025, 3, 10, 3, 0, 0));
    }

    #[test]
    fn test_calendar_day_ignores_earliest_event() {
        let window = QuotaWindow::calendar_day(0).unwrap();
        let now = utc(2025, 3, 10, 12, 0, 0);
        let earliest = utc(2025, 3, 10, 1, 0, 0);
        assert_eq!(window.reopens_at(now, Some(earliest)), utc(2025, 3, 11, 0, 0, 0));
    }

    #[test]
    fn test_invalid_offset() {
        assert!(QuotaWindow::calendar_day(24 * 60).is_err());
        assert!(QuotaWindow::calendar_day(-24 * 60).is_err());
        assert!(QuotaWindow::calendar_day(14 * 60).is_ok());
    }

    #[test]
    fn test_quota_accounting() {
        let quota = Quota::new(3, QuotaWindow::sliding_hours(12));
        assert!(!quota.is_exhausted(2));
        assert!(quota.is_exhausted(3));
        assert!(quota.is_exhausted(4));
        assert_eq!(quota.remaining(1), 2);
        assert_eq!(quota.remaining(5), 0);
    }
}
