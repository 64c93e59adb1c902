//! ISO 8601 date/timestamp handling for roster date columns.
//!
//! Only complete dates are accepted. Partial dates (`2024-03`, `2024`) carry
//! no day and are treated as missing; nothing here imputes a day.
//!
//! Accepted text forms (extended format, delimiters required):
//! - `YYYY-MM-DD`
//! - `YYYY-MM-DDThh:mm`
//! - `YYYY-MM-DDThh:mm:ss[.fff]`, optionally with a trailing `Z`
//! - the same forms with a single space instead of `T`

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::{AnyValue, TimeUnit};

/// Days from 0001-01-01 (CE day 1) to the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO 8601 date or date-time string.
///
/// Dates without a time component resolve to midnight.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use tte_common::parse_timestamp;
///
/// let midnight = NaiveDate::from_ymd_opt(2025, 1, 10)
///     .unwrap()
///     .and_hms_opt(0, 0, 0)
///     .unwrap();
/// assert_eq!(parse_timestamp("2025-01-10"), Some(midnight));
/// assert_eq!(parse_timestamp("2025-01"), None);
/// assert_eq!(parse_timestamp(""), None);
/// ```
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.len() < 10 {
        return None;
    }
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    if trimmed.len() == 10 {
        return NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Formats a timestamp as ISO 8601.
///
/// Midnight values are written as plain dates, everything else keeps
/// second precision.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// Converts a roster cell to a timestamp.
///
/// Handles native `Date` and `Datetime` columns as well as text columns.
/// Returns `None` for nulls, empty strings, partial dates, and anything
/// that does not parse.
pub fn any_to_timestamp(value: &AnyValue<'_>) -> Option<NaiveDateTime> {
    match value {
        AnyValue::Null => None,
        AnyValue::Date(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|date| date.and_time(NaiveTime::MIN)),
        AnyValue::Datetime(raw, unit, _) | AnyValue::DatetimeOwned(raw, unit, _) => {
            from_epoch(*raw, *unit)
        }
        AnyValue::String(s) => parse_timestamp(s),
        AnyValue::StringOwned(s) => parse_timestamp(s),
        _ => None,
    }
}

fn from_epoch(raw: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let utc = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(raw)?,
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(raw)?,
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(raw),
    };
    Some(utc.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    #[test]
    fn test_parse_date_only() {
        assert_eq!(parse_timestamp("2025-06-01"), Some(ts(2025, 6, 1, 0, 0, 0)));
        assert_eq!(
            parse_timestamp("  2025-06-01  "),
            Some(ts(2025, 6, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_parse_datetime_forms() {
        let expected = ts(2025, 6, 1, 13, 45, 0);
        assert_eq!(parse_timestamp("2025-06-01T13:45"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01T13:45:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01 13:45:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01T13:45:00Z"), Some(expected));
    }

    #[test]
    fn test_parse_rejects_partial_and_invalid() {
        assert_eq!(parse_timestamp("2025-06"), None);
        assert_eq!(parse_timestamp("2025"), None);
        assert_eq!(parse_timestamp("2025-02-30"), None);
        assert_eq!(parse_timestamp("20250601"), None);
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(ts(2025, 1, 1, 0, 0, 0)), "2025-01-01");
        assert_eq!(
            format_timestamp(ts(2025, 1, 1, 8, 30, 5)),
            "2025-01-01T08:30:05"
        );
    }

    #[test]
    fn test_any_to_timestamp_date() {
        // 2025-01-01 is day 20089 since the Unix epoch
        assert_eq!(
            any_to_timestamp(&AnyValue::Date(20089)),
            Some(ts(2025, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            any_to_timestamp(&AnyValue::Date(0)),
            Some(ts(1970, 1, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_any_to_timestamp_datetime() {
        let millis = ts(2025, 1, 1, 12, 0, 0).and_utc().timestamp_millis();
        assert_eq!(
            any_to_timestamp(&AnyValue::Datetime(millis, TimeUnit::Milliseconds, None)),
            Some(ts(2025, 1, 1, 12, 0, 0))
        );
    }

    #[test]
    fn test_any_to_timestamp_text_and_null() {
        assert_eq!(
            any_to_timestamp(&AnyValue::String("2025-03-01")),
            Some(ts(2025, 3, 1, 0, 0, 0))
        );
        assert_eq!(any_to_timestamp(&AnyValue::String("")), None);
        assert_eq!(any_to_timestamp(&AnyValue::Null), None);
        assert_eq!(any_to_timestamp(&AnyValue::Int32(5)), None);
    }
}
