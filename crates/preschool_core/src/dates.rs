//! Calendar helpers shared by attendance, reports and finance.
//!
//! Dates are keyed as ISO `YYYY-MM-DD`. Forms may still submit the display
//! format `MM/DD/YYYY`; `parse_date` normalises both.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("'{0}' is not a date (expected YYYY-MM-DD or MM/DD/YYYY)")]
    Unparseable(String),
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("range of {days} days exceeds the limit of {limit}")]
    RangeTooLong { days: i64, limit: i64 },
}

/// Longest range any aggregate is computed over.
pub const MAX_RANGE_DAYS: i64 = 366;

pub fn parse_date(raw: &str) -> Result<NaiveDate, DateError> {
    let t = raw.trim();
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(t, "%m/%d/%Y"))
        .map_err(|_| DateError::Unparseable(raw.to_string()))
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Checks an inclusive range and returns its length in days.
pub fn checked_range(start: NaiveDate, end: NaiveDate) -> Result<i64, DateError> {
    if start > end {
        return Err(DateError::InvertedRange { start, end });
    }
    let days = (end - start).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(DateError::RangeTooLong {
            days,
            limit: MAX_RANGE_DAYS,
        });
    }
    Ok(days)
}

/// Every calendar day in `[start, end]`; empty when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let count = if start > end {
        0
    } else {
        (end - start).num_days() + 1
    };
    (0..count).map(move |offset| start + Duration::days(offset))
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    days_inclusive(start, end).filter(|d| !is_weekend(*d)).count() as u32
}

/// First and last calendar day of a month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), DateError> {
    if !(1..=12).contains(&month) {
        return Err(DateError::InvalidMonth(month));
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(DateError::InvalidMonth(month))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or(DateError::InvalidMonth(month))?;
    Ok((first, next_first - Duration::days(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn display_format_normalises_to_iso() {
        assert_eq!(to_iso(d("01/10/2024")), "2024-01-10");
        assert_eq!(d("2024-01-10"), d("01/10/2024"));
        assert!(parse_date("10.01.2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn month_bounds_handle_leap_years_and_december() {
        assert_eq!(month_bounds(2024, 2).unwrap(), (d("2024-02-01"), d("2024-02-29")));
        assert_eq!(month_bounds(2023, 2).unwrap().1, d("2023-02-28"));
        assert_eq!(month_bounds(2024, 12).unwrap().1, d("2024-12-31"));
        assert_eq!(month_bounds(2024, 13), Err(DateError::InvalidMonth(13)));
    }

    #[test]
    fn working_days_skip_weekends() {
        // January 2024 starts on a Monday and has 23 weekdays.
        let (first, last) = month_bounds(2024, 1).unwrap();
        assert_eq!(working_days(first, last), 23);
        // Saturday and Sunday only.
        assert_eq!(working_days(d("2024-01-06"), d("2024-01-07")), 0);
    }

    #[test]
    fn ranges_are_inclusive_and_bounded() {
        assert_eq!(days_inclusive(d("2024-01-30"), d("2024-02-02")).count(), 4);
        assert_eq!(days_inclusive(d("2024-02-02"), d("2024-01-30")).count(), 0);
        assert_eq!(checked_range(d("2024-01-01"), d("2024-01-01")), Ok(1));
        assert!(matches!(
            checked_range(d("2024-01-02"), d("2024-01-01")),
            Err(DateError::InvertedRange { .. })
        ));
        assert!(matches!(
            checked_range(d("2023-01-01"), d("2024-12-31")),
            Err(DateError::RangeTooLong { .. })
        ));
    }
}
