//! Wall-clock times on the schedule grid.

use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;

/// Time of day with minute precision, rendered as zero-padded 24-hour `HH:MM`.
///
/// Ordering is chronological, which matches the lexicographic ordering of the
/// rendered strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

/// Latest time a snapped value may take.
const LAST_SLOT_MINUTES: u32 = 23 * 60 + 55;

impl ClockTime {
    /// Builds a time from hour and minute; `None` if out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(ClockTime)
    }

    /// Builds a time from minutes since midnight, clamped to the last minute of the day.
    pub fn from_minutes(total: u32) -> Self {
        let total = total.min(24 * 60 - 1);
        ClockTime(
            NaiveTime::from_hms_opt(total / 60, total % 60, 0).unwrap_or(NaiveTime::MIN),
        )
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour() * 60 + self.minute()
    }

    /// Rounds to the nearest 5-minute boundary.
    ///
    /// A minute that rounds up to 60 carries into the next hour. Times past
    /// 23:55 saturate at 23:55.
    pub fn snap_to_5min(&self) -> Self {
        let minute = (self.minute() + 2) / 5 * 5;
        let (hour, minute) = if minute == 60 {
            (self.hour() + 1, 0)
        } else {
            (self.hour(), minute)
        };
        Self::from_minutes((hour * 60 + minute).min(LAST_SLOT_MINUTES))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for ClockTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
