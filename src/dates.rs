//! Permissive parsing of `publish_time` values.
//!
//! The metadata mixes full dates, timestamps, month-name dates and bare
//! years. Anything that cannot be read as a calendar date yields `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%b %d %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y %b %d",
    "%Y %B %d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    parse_partial(s)
}

/// `YYYY-MM` and `YYYY` fall back to the first day of the period.
fn parse_partial(s: &str) -> Option<NaiveDate> {
    let (year, month) = match s.split_once('-') {
        Some((y, m)) if y.len() == 4 && (1..=2).contains(&m.len()) => (y, m.parse::<u32>().ok()?),
        Some(_) => return None,
        None if s.len() == 4 => (s, 1),
        None => return None,
    };

    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_iso_and_slash_dates() {
        assert_eq!(parse_date("2020-03-01"), ymd(2020, 3, 1));
        assert_eq!(parse_date("2020/03/01"), ymd(2020, 3, 1));
        assert_eq!(parse_date("03/15/2020"), ymd(2020, 3, 15));
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(parse_date("2020-03-01 12:30:00"), ymd(2020, 3, 1));
        assert_eq!(parse_date("2020-03-01T12:30:00Z"), ymd(2020, 3, 1));
        assert_eq!(parse_date("2020-03-01T12:30:00.250"), ymd(2020, 3, 1));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(parse_date("Mar 1 2020"), ymd(2020, 3, 1));
        assert_eq!(parse_date("1 March 2020"), ymd(2020, 3, 1));
        assert_eq!(parse_date("March 1, 2020"), ymd(2020, 3, 1));
    }

    #[test]
    fn test_partial_dates() {
        assert_eq!(parse_date("2020"), ymd(2020, 1, 1));
        assert_eq!(parse_date("2020-07"), ymd(2020, 7, 1));
        assert_eq!(parse_date(" 2019 "), ymd(2019, 1, 1));
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2020-13"), None);
        assert_eq!(parse_date("2020-02-30"), None);
        assert_eq!(parse_date("abcd"), None);
    }
}
