//! Lenient order-date parsing.
//!
//! Sales exports come out of spreadsheets, ERPs and BI tools with little
//! agreement on date layout. We accept a fixed, ordered list of common forms;
//! the first that parses wins, which keeps the result deterministic.
//!
//! Ambiguous numeric dates (`03/04/2023`) are read month-first. Day-first is
//! only used when month-first is impossible (`24/02/2003`).

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const DATETIME_FMTS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FMTS: [&str; 15] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Two-digit-year forms, tried last so four-digit years are never truncated.
const SHORT_YEAR_FMTS: [&str; 3] = ["%m/%d/%y", "%d/%m/%y", "%d-%b-%y"];

/// Parse a free-form order date; any time-of-day component is discarded.
///
/// Returns `None` for empty or unrecognised input.
pub fn parse_order_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            if has_full_year(dt.date()) {
                return Some(dt.date());
            }
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            if has_full_year(d) {
                return Some(d);
            }
        }
    }

    if let Some(d) = parse_compact(s) {
        return Some(d);
    }
    if let Some(d) = parse_year_month(s) {
        return Some(d);
    }

    for fmt in SHORT_YEAR_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    None
}

/// `%Y` happily reads `03` as year 3; leave those to the two-digit-year forms.
fn has_full_year(d: NaiveDate) -> bool {
    (1000..=9999).contains(&d.year())
}

/// `YYYYMMDD`.
fn parse_compact(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let y = s[0..4].parse().ok()?;
    let m = s[4..6].parse().ok()?;
    let d = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// `YYYY-MM` or `YYYY/MM`, mapped to the first of the month.
fn parse_year_month(s: &str) -> Option<NaiveDate> {
    let (y, m) = s.split_once(['-', '/'])?;
    if y.len() != 4 || m.is_empty() || m.len() > 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn iso_forms() {
        assert_eq!(parse_order_date("2023-01-05"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("2023-01-05 13:45:00"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("2023-01-05T13:45:00"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("2023-01-05T13:45:00Z"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("2023-01-05 13:45:00+02:00"), ymd(2023, 1, 5));
    }

    #[test]
    fn us_export_with_time() {
        assert_eq!(parse_order_date("2/24/2003 0:00"), ymd(2003, 2, 24));
        assert_eq!(parse_order_date("12/1/2004 0:00"), ymd(2004, 12, 1));
        assert_eq!(parse_order_date("5/7/2003 3:15 PM"), ymd(2003, 5, 7));
    }

    #[test]
    fn ambiguous_numeric_dates_are_month_first() {
        assert_eq!(parse_order_date("03/04/2023"), ymd(2023, 3, 4));
    }

    #[test]
    fn day_first_when_month_first_is_impossible() {
        assert_eq!(parse_order_date("24/02/2003"), ymd(2003, 2, 24));
        assert_eq!(parse_order_date("24.02.2003"), ymd(2003, 2, 24));
    }

    #[test]
    fn named_months() {
        assert_eq!(parse_order_date("05-Jan-2023"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("Jan 5, 2023"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("5 January 2023"), ymd(2023, 1, 5));
    }

    #[test]
    fn compact_and_year_month() {
        assert_eq!(parse_order_date("20230105"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("2023-07"), ymd(2023, 7, 1));
    }

    #[test]
    fn two_digit_years() {
        assert_eq!(parse_order_date("2/24/03"), ymd(2003, 2, 24));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_order_date(""), None);
        assert_eq!(parse_order_date("   "), None);
        assert_eq!(parse_order_date("not a date"), None);
        assert_eq!(parse_order_date("2023-13-01"), None);
        assert_eq!(parse_order_date("2023-02-30"), None);
        assert_eq!(parse_order_date("99999999"), None);
    }
}
