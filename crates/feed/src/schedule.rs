//! Weekday wall-clock schedule for the daily job.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use std::fmt;

/// Fires once per weekday (Monday to Friday) at a fixed wall-clock time in a timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    time: NaiveTime,
    tz: Tz,
}

impl Schedule {
    /// Create a schedule firing at `time` in `tz`.
    #[must_use]
    pub const fn new(time: NaiveTime, tz: Tz) -> Self {
        Self { time, tz }
    }

    /// Wall-clock firing time.
    #[must_use]
    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    /// Timezone of the firing time.
    #[must_use]
    pub const fn tz(&self) -> Tz {
        self.tz
    }

    /// Returns the first firing instant strictly after `after`.
    ///
    /// Weekend days and local times skipped by a DST transition never fire.
    #[must_use]
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after.with_timezone(&self.tz).date_naive();
        (0..14)
            .map(|offset| start + Duration::days(offset))
            .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .filter_map(|day| {
                self.tz
                    .from_local_datetime(&day.and_time(self.time))
                    .earliest()
            })
            .map(|local| local.with_timezone(&Utc))
            .find(|instant| *instant > after)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mon-Fri {} {}", self.time.format("%H:%M"), self.tz)
    }
}
