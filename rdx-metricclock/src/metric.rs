//! Converts wall-clock instants into metric time readings.
//!
//! Everything here is pure: the same instant, zone and units always give the
//! same reading. The engine is the only caller at runtime, so no two parts of
//! the system compute a reading independently.

use crate::config::ClockZone;
use chrono::{DateTime, Datelike, Local, NaiveTime, TimeZone, Timelike, Utc};
use std::fmt;

/// Milliseconds in a standard 24-hour day.
pub const MS_PER_DAY: u64 = 86_400_000;

/// Milliday progress is always scaled against a 365-day year, even in leap years.
pub const MILLIDAY_YEAR_DAYS: u32 = 365;

/// The unit bases of one day partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockUnits {
    pub hours_per_day: u32,
    /// Minutes per hour.
    pub units_per_hour: u32,
    /// Seconds per minute.
    pub units_per_minute: u32,
}

impl ClockUnits {
    pub const STANDARD: ClockUnits = ClockUnits {
        hours_per_day: 24,
        units_per_hour: 60,
        units_per_minute: 60,
    };

    pub const METRIC: ClockUnits = ClockUnits {
        hours_per_day: 10,
        units_per_hour: 100,
        units_per_minute: 100,
    };

    /// Number of clock seconds in one day.
    pub fn seconds_per_day(&self) -> u64 {
        u64::from(self.hours_per_day)
            * u64::from(self.units_per_hour)
            * u64::from(self.units_per_minute)
    }
}

/// A single reading of the metric clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricReading {
    pub calendar_year: i32,
    /// Day-of-year progress over a fixed 365-day year (0..=999, 1002 on leap day 366).
    pub milliday_progress: u32,
    pub metric_hour: u32,
    pub metric_minute: u32,
    pub metric_second: u32,
}

impl MetricReading {
    /// The reading published before the first tick.
    pub fn epoch() -> Self {
        Self {
            calendar_year: 1970,
            ..Default::default()
        }
    }
}

/// Renders the reading as `H:MM:SS`.
impl fmt::Display for MetricReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02}:{:02}",
            self.metric_hour, self.metric_minute, self.metric_second
        )
    }
}

/// Day-of-year progress against a 365-day year, with `day_of_year` 1-based.
///
/// The quotient is strictly below the scaled value, so the last day of a
/// common year reads 999 rather than 1000. Leap day 366 reads 1002.
pub fn milliday_progress(day_of_year: u32) -> u32 {
    (day_of_year * 1000).saturating_sub(1) / MILLIDAY_YEAR_DAYS
}

/// Computes the reading for `now` in `now`'s own time zone.
pub fn compute<Tz: TimeZone>(now: &DateTime<Tz>, units: ClockUnits) -> MetricReading {
    let ms_passed = ms_since_local_midnight(now);
    // Integer arithmetic floors exactly; a float fraction could round up at unit boundaries.
    let total_seconds = ms_passed * units.seconds_per_day() / MS_PER_DAY;
    let per_hour = u64::from(units.units_per_hour) * u64::from(units.units_per_minute);
    let per_minute = u64::from(units.units_per_minute);

    MetricReading {
        calendar_year: now.year(),
        milliday_progress: milliday_progress(now.ordinal()),
        metric_hour: (total_seconds / per_hour) as u32,
        metric_minute: ((total_seconds / per_minute) % u64::from(units.units_per_hour)) as u32,
        metric_second: (total_seconds % per_minute) as u32,
    }
}

/// Resolves a UTC instant into `zone` and computes the reading there.
pub fn compute_in_zone(now: DateTime<Utc>, zone: ClockZone, units: ClockUnits) -> MetricReading {
    match zone {
        ClockZone::Local => compute(&now.with_timezone(&Local), units),
        ClockZone::Named(tz) => compute(&now.with_timezone(&tz), units),
    }
}

/// Real milliseconds elapsed since the start of `now`'s local day, wrapped into `0..MS_PER_DAY`.
///
/// On a 25-hour day the final hour wraps around to the start of the clock.
fn ms_since_local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> u64 {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let elapsed = match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(start) => now.clone().signed_duration_since(start).num_milliseconds(),
        // Zones that skip midnight on a DST change: fall back to the wall clock.
        None => {
            let millis = (now.nanosecond() / 1_000_000).min(999);
            i64::from(now.num_seconds_from_midnight()) * 1000 + i64::from(millis)
        }
    };
    elapsed.rem_euclid(MS_PER_DAY as i64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, NaiveDate};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_milli_opt(h, min, s, ms)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn midnight_is_zero_in_every_mode() {
        let now = utc(2025, 6, 15, 0, 0, 0, 0);
        for units in [ClockUnits::STANDARD, ClockUnits::METRIC] {
            let reading = compute(&now, units);
            assert_eq!(
                (reading.metric_hour, reading.metric_minute, reading.metric_second),
                (0, 0, 0)
            );
        }
    }

    #[test]
    fn standard_mode_mirrors_the_wall_clock() {
        let reading = compute(&utc(2025, 3, 9, 13, 45, 30, 999), ClockUnits::STANDARD);
        assert_eq!(reading.to_string(), "13:45:30");
    }

    #[test]
    fn metric_mode_scales_the_day() {
        // Noon is half the day: 5 metric hours.
        let noon = compute(&utc(2025, 3, 9, 12, 0, 0, 0), ClockUnits::METRIC);
        assert_eq!(noon.to_string(), "5:00:00");

        // 18:00 is three quarters of the day: 7.5 metric hours.
        let evening = compute(&utc(2025, 3, 9, 18, 0, 0, 0), ClockUnits::METRIC);
        assert_eq!(evening.to_string(), "7:50:00");

        // One metric second is 864 real milliseconds.
        let tick = compute(&utc(2025, 3, 9, 0, 0, 0, 864), ClockUnits::METRIC);
        assert_eq!(tick.metric_second, 1);
        let almost = compute(&utc(2025, 3, 9, 0, 0, 0, 863), ClockUnits::METRIC);
        assert_eq!(almost.metric_second, 0);
    }

    #[test]
    fn last_millisecond_of_the_day_never_rolls_over() {
        let reading = compute(&utc(2025, 3, 9, 23, 59, 59, 999), ClockUnits::METRIC);
        assert_eq!(reading.to_string(), "9:99:99");
        let reading = compute(&utc(2025, 3, 9, 23, 59, 59, 999), ClockUnits::STANDARD);
        assert_eq!(reading.to_string(), "23:59:59");
    }

    #[test]
    fn modes_agree_on_calendar_fields() {
        let mut now = utc(2024, 1, 1, 0, 0, 0, 0);
        for _ in 0..400 {
            let standard = compute(&now, ClockUnits::STANDARD);
            let metric = compute(&now, ClockUnits::METRIC);
            assert_eq!(standard.calendar_year, metric.calendar_year);
            assert_eq!(standard.milliday_progress, metric.milliday_progress);
            now += Duration::minutes(1357);
        }
    }

    #[test]
    fn milliday_uses_a_fixed_year() {
        assert_eq!(compute(&utc(2023, 1, 1, 8, 0, 0, 0), ClockUnits::STANDARD).milliday_progress, 2);
        assert_eq!(compute(&utc(2023, 12, 31, 8, 0, 0, 0), ClockUnits::STANDARD).milliday_progress, 999);
        // Leap years keep the 365 denominator.
        assert_eq!(milliday_progress(366), 1002);
        assert_eq!(compute(&utc(2024, 12, 31, 8, 0, 0, 0), ClockUnits::STANDARD).milliday_progress, 1002);
    }

    #[test]
    fn local_day_is_resolved_in_the_instant_zone() {
        // 23:30 UTC is already 01:30 the next day at UTC+2.
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = utc(2023, 12, 31, 23, 30, 0, 0).with_timezone(&offset);
        let reading = compute(&now, ClockUnits::STANDARD);
        assert_eq!(reading.calendar_year, 2024);
        assert_eq!(reading.milliday_progress, 2);
        assert_eq!(reading.to_string(), "1:30:00");
    }

    #[test]
    fn named_zone_counts_real_time_across_dst() {
        // Europe/Paris springs forward at 02:00 on 2025-03-30; 04:00 local is 3 real hours after midnight.
        let zone = ClockZone::Named(chrono_tz::Europe::Paris);
        let now = utc(2025, 3, 30, 2, 0, 0, 0);
        let reading = compute_in_zone(now, zone, ClockUnits::STANDARD);
        assert_eq!(reading.to_string(), "3:00:00");
    }

    #[test]
    fn named_zone_wraps_the_extra_hour_when_falling_back() {
        // Europe/Paris falls back at 03:00 on 2025-10-26; local midnight is 22:00 UTC the day before.
        let zone = ClockZone::Named(chrono_tz::Europe::Paris);
        let last_regular = compute_in_zone(utc(2025, 10, 26, 21, 59, 59, 0), zone, ClockUnits::STANDARD);
        assert_eq!(last_regular.to_string(), "23:59:59");

        let readings: Vec<String> = [(22, 0), (22, 30), (22, 59)]
            .iter()
            .map(|&(h, m)| compute_in_zone(utc(2025, 10, 26, h, m, 0, 0), zone, ClockUnits::STANDARD).to_string())
            .collect();
        assert_eq!(readings, ["0:00:00", "0:30:00", "0:59:00"]);
    }

    #[test]
    fn milliday_range_for_common_years() {
        assert_eq!(milliday_progress(1), 2);
        assert_eq!(milliday_progress(73), 199);
        assert_eq!(milliday_progress(365), 999);
    }

    #[test]
    fn epoch_reading_is_zeroed() {
        let reading = MetricReading::epoch();
        assert_eq!(reading.calendar_year, 1970);
        assert_eq!(reading.to_string(), "0:00:00");
    }
}
