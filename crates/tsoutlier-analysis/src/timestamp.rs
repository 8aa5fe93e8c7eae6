//! Timestamp parsing for the `time_index` column.
//!
//! Accepted layouts, tried in order:
//!
//! - RFC 3339 (`2021-03-04T05:06:07+09:00`), converted to UTC
//! - `%Y-%m-%d %H:%M:%S` and `%Y-%m-%dT%H:%M:%S`, with optional fractional seconds
//! - `%Y-%m-%d %H:%M` and `%Y-%m-%dT%H:%M`
//! - `%Y-%m-%d` (midnight)
//!
//! Layouts without an offset are interpreted as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `time_index` cell into a UTC timestamp.
///
/// Returns `None` if the text matches none of the accepted layouts.
///
/// # Examples
///
/// ```
/// use tsoutlier_analysis::timestamp::parse_timestamp;
///
/// let ts = parse_timestamp("2021-01-02 03:04:05").unwrap();
/// assert_eq!(ts.to_rfc3339(), "2021-01-02T03:04:05+00:00");
///
/// let ts = parse_timestamp("2021-01-02").unwrap();
/// assert_eq!(ts.to_rfc3339(), "2021-01-02T00:00:00+00:00");
///
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike as _, Timelike as _};

    use super::*;

    #[test]
    fn test_rfc3339_is_converted_to_utc() {
        let ts = parse_timestamp("2021-03-04T05:06:07+09:00").unwrap();
        assert_eq!(ts.day(), 3);
        assert_eq!(ts.hour(), 20);
    }

    #[test]
    fn test_fractional_seconds() {
        let ts = parse_timestamp("2021-03-04 05:06:07.250").unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_minute_precision() {
        let ts = parse_timestamp("2021-03-04T05:06").unwrap();
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (5, 6, 0));
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert!(parse_timestamp("  2021-03-04  ").is_some());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2021-13-01").is_none());
        assert!(parse_timestamp("12345").is_none());
    }
}
