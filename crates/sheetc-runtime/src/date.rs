//! Dates as 1900-system serial numbers
//!
//! Serial 1 is 1900-01-01. The 1900 system keeps the historical phantom day
//! 1900-02-29 as serial 60, so serials from 61 on are one ahead of a plain day
//! count from 1899-12-31.

use std::fmt;
use std::ops::{Add, Sub};

use chrono::{Datelike, Duration, Local, NaiveDate, Timelike};

/// A calendar date, optionally with a time-of-day fraction
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Date(f64);

impl Date {
    pub fn from_serial(serial: f64) -> Self {
        Date(serial)
    }

    pub fn serial(self) -> f64 {
        self.0
    }

    /// Build a date the way `DATE(year, month, day)` does
    ///
    /// Years below 1900 are offset by 1900; months and days outside their usual
    /// range roll over into neighbouring months.
    pub fn from_ymd(year: f64, month: f64, day: f64) -> Self {
        let mut year = year.trunc() as i64;
        if (0..1900).contains(&year) {
            year += 1900;
        }
        let total_months = year * 12 + (month.trunc() as i64 - 1);
        let norm_year = total_months.div_euclid(12) as i32;
        let norm_month = total_months.rem_euclid(12) as u32 + 1;
        let serial = serial_month_start(norm_year, norm_month) + day.trunc() as i64 - 1;
        Date(serial as f64)
    }

    /// Current date
    pub fn today() -> Self {
        let now = Local::now();
        Date(serial_month_start(now.year(), now.month()) as f64 + now.day() as f64 - 1.0)
    }

    /// Current date and time
    pub fn now() -> Self {
        let now = Local::now();
        let seconds = now.hour() as f64 * 3600.0 + now.minute() as f64 * 60.0 + now.second() as f64;
        Date(Self::today().0 + seconds / 86400.0)
    }

    pub fn year(self) -> f64 {
        self.parts().map_or(f64::NAN, |(y, _, _)| y as f64)
    }

    pub fn month(self) -> f64 {
        self.parts().map_or(f64::NAN, |(_, m, _)| m as f64)
    }

    pub fn day(self) -> f64 {
        self.parts().map_or(f64::NAN, |(_, _, d)| d as f64)
    }

    fn parts(self) -> Option<(i32, u32, u32)> {
        let serial = self.0.floor() as i64;
        if serial == 60 {
            return Some((1900, 2, 29));
        }
        let base = NaiveDate::from_ymd_opt(1899, 12, 31)?;
        let adjusted = if serial > 60 { serial - 1 } else { serial };
        let date = base.checked_add_signed(Duration::days(adjusted))?;
        Some((date.year(), date.month(), date.day()))
    }
}

fn is_leap(year: i32) -> bool {
    (year % 4 == 0) && ((year % 100 != 0) || (year % 400 == 0))
}

fn days_in_month(year: i32, month: u32) -> i64 {
    match month {
        2 if year == 1900 || is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Serial of the first day of a month
fn serial_month_start(year: i32, month: u32) -> i64 {
    if year < 1900 {
        let first = NaiveDate::from_ymd_opt(year, month, 1);
        let base = NaiveDate::from_ymd_opt(1899, 12, 31);
        return match (first, base) {
            (Some(first), Some(base)) => (first - base).num_days(),
            _ => 0,
        };
    }
    let mut days: i64 = 0;
    for y in 1900..year {
        days += if y == 1900 || is_leap(y) { 366 } else { 365 };
    }
    for m in 1..month {
        days += days_in_month(year, m);
    }
    1 + days
}

impl Add<f64> for Date {
    type Output = Date;

    fn add(self, days: f64) -> Date {
        Date(self.0 + days)
    }
}

impl Sub<f64> for Date {
    type Output = Date;

    fn sub(self, days: f64) -> Date {
        Date(self.0 - days)
    }
}

impl Sub<Date> for Date {
    type Output = f64;

    fn sub(self, other: Date) -> f64 {
        self.0 - other.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts() {
            Some((y, m, d)) => write!(f, "{:04}-{:02}-{:02}", y, m, d),
            None => write!(f, "{}", self.0),
        }
    }
}

/// `date + days`
pub fn date_add(date: Date, days: f64) -> Date {
    date + days
}

/// `date - days`
pub fn date_sub(date: Date, days: f64) -> Date {
    date - days
}

/// Days from `earlier` to `later`
pub fn date_diff(later: Date, earlier: Date) -> f64 {
    later - earlier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_serials() {
        assert_eq!(Date::from_ymd(1900.0, 1.0, 1.0).serial(), 1.0);
        assert_eq!(Date::from_ymd(1900.0, 3.0, 1.0).serial(), 61.0);
        assert_eq!(Date::from_ymd(2024.0, 1.0, 15.0).serial(), 45306.0);
    }

    #[test]
    fn test_parts_round_trip() {
        let date = Date::from_ymd(2024.0, 2.0, 29.0);
        assert_eq!((date.year(), date.month(), date.day()), (2024.0, 2.0, 29.0));
        assert_eq!(Date::from_serial(60.0).month(), 2.0);
        assert_eq!(date.to_string(), "2024-02-29");
    }

    #[test]
    fn test_month_overflow() {
        assert_eq!(Date::from_ymd(2023.0, 13.0, 1.0), Date::from_ymd(2024.0, 1.0, 1.0));
        assert_eq!(Date::from_ymd(2024.0, 3.0, 0.0), Date::from_ymd(2024.0, 2.0, 29.0));
    }

    #[test]
    fn test_arithmetic() {
        let start = Date::from_ymd(2024.0, 1.0, 30.0);
        let later = date_add(start, 3.0);
        assert_eq!(later, Date::from_ymd(2024.0, 2.0, 2.0));
        assert_eq!(date_diff(later, start), 3.0);
        assert_eq!(date_sub(later, 3.0), start);
    }
}
