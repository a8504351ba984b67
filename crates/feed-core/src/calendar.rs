//! Clock abstraction and US equity market calendar helpers.
//!
//! Every "what day is it" decision in the workspace goes through a [`Clock`] so that tests
//! can pin "now". Dates are interpreted in [`REFERENCE_TZ`] regardless of server locale.
//!
//! Only weekends are treated as non-trading days; exchange holidays are not modelled.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use std::fmt::Debug;

/// Timezone that defines "today" and the market close boundary.
pub const REFERENCE_TZ: Tz = chrono_tz::America::New_York;

/// Hour (reference timezone, 24h) at which the regular session closes.
pub const MARKET_CLOSE_HOUR: u32 = 16;

/// Source of the current instant.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current instant in the reference timezone.
    fn market_now(&self) -> DateTime<Tz> {
        self.now().with_timezone(&REFERENCE_TZ)
    }

    /// Returns today's date in the reference timezone.
    fn market_today(&self) -> NaiveDate {
        self.market_now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    /// Creates a clock frozen at `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Creates a clock frozen at a wall-clock time in the reference timezone.
    ///
    /// Returns `None` for local times that do not exist (DST gaps) or invalid dates.
    #[must_use]
    pub fn at_market_time(date: NaiveDate, hour: u32, minute: u32) -> Option<Self> {
        let local = date.and_hms_opt(hour, minute, 0)?;
        let instant = REFERENCE_TZ.from_local_datetime(&local).earliest()?;
        Some(Self::new(instant.with_timezone(&Utc)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Returns true for Saturday and Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Returns true once the regular session has closed on `now`'s date.
#[must_use]
pub fn is_after_close(now: &DateTime<Tz>) -> bool {
    now.hour() >= MARKET_CLOSE_HOUR
}

/// Returns the closest weekday strictly before `date`.
#[must_use]
pub fn previous_business_day(date: NaiveDate) -> NaiveDate {
    let mut day = date - Duration::days(1);
    while is_weekend(day) {
        day -= Duration::days(1);
    }
    day
}

/// Returns the most recent session whose daily bar should already be published.
///
/// On weekends this is the preceding Friday. On weekdays it is today once the close has
/// passed, otherwise the previous business day.
#[must_use]
pub fn latest_available_market_date(now: &DateTime<Tz>) -> NaiveDate {
    let today = now.date_naive();
    if is_weekend(today) || !is_after_close(now) {
        previous_business_day(today)
    } else {
        today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn market(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> DateTime<Tz> {
        FixedClock::at_market_time(date(y, m, d), hour, minute)
            .unwrap()
            .market_now()
    }

    #[test]
    fn test_fixed_clock_converts_to_eastern() {
        // 20:30 UTC in June is 16:30 EDT.
        let utc = Utc.with_ymd_and_hms(2024, 6, 17, 20, 30, 0).unwrap();
        let clock = FixedClock::new(utc);
        let now = clock.market_now();
        assert_eq!(now.hour(), 16);
        assert_eq!(clock.market_today(), date(2024, 6, 17));
    }

    #[test]
    fn test_market_today_differs_from_utc_date() {
        // 02:00 UTC on the 18th is still the evening of the 17th in New York.
        let utc = Utc.with_ymd_and_hms(2024, 6, 18, 2, 0, 0).unwrap();
        assert_eq!(FixedClock::new(utc).market_today(), date(2024, 6, 17));
    }

    #[test]
    fn test_previous_business_day_skips_weekend() {
        // Monday -> Friday
        assert_eq!(previous_business_day(date(2024, 6, 17)), date(2024, 6, 14));
        // Wednesday -> Tuesday
        assert_eq!(previous_business_day(date(2024, 6, 19)), date(2024, 6, 18));
        // Sunday -> Friday
        assert_eq!(previous_business_day(date(2024, 6, 16)), date(2024, 6, 14));
    }

    #[test]
    fn test_after_close_boundary() {
        assert!(!is_after_close(&market(2024, 6, 17, 15, 59)));
        assert!(is_after_close(&market(2024, 6, 17, 16, 0)));
        assert!(is_after_close(&market(2024, 6, 17, 23, 30)));
    }

    #[test]
    fn test_latest_available_on_weekend() {
        // Saturday and Sunday resolve to the preceding Friday, even after 16:00.
        assert_eq!(
            latest_available_market_date(&market(2024, 6, 15, 18, 0)),
            date(2024, 6, 14)
        );
        assert_eq!(
            latest_available_market_date(&market(2024, 6, 16, 9, 0)),
            date(2024, 6, 14)
        );
    }

    #[test]
    fn test_latest_available_on_weekday() {
        // Monday morning: Friday's bar is the newest one.
        assert_eq!(
            latest_available_market_date(&market(2024, 6, 17, 10, 0)),
            date(2024, 6, 14)
        );
        // Monday after the close: today's bar.
        assert_eq!(
            latest_available_market_date(&market(2024, 6, 17, 16, 5)),
            date(2024, 6, 17)
        );
        // Tuesday before the close: Monday.
        assert_eq!(
            latest_available_market_date(&market(2024, 6, 18, 9, 30)),
            date(2024, 6, 17)
        );
    }
}
