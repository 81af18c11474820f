//! Conversions shared by every relational read and every tool payload.
//!
//! Timestamps are persisted as second-precision RFC 3339 UTC text so that
//! window filters can compare them as strings. Fixed-point decimals are
//! persisted as integer hundredths and surfaced as `f64`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{json, Value};

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Accepts RFC 3339 with any offset, naive `T`/space separated datetimes
/// (read as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| Utc.from_utc_datetime(&n))
}

/// Reads the calendar date prefix of a date or datetime string.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn to_hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

pub fn from_hundredths(value: i64) -> f64 {
    value as f64 / 100.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Serializes a record for the model. Never fails: a value that cannot be
/// represented becomes a structured error.
pub fn to_json_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        json!({ "error": format!("serialization failed: {}", e), "code": "serialization_error" })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let ts = parse_timestamp("2024-05-20T10:00:00+09:00").unwrap();
        assert_eq!(format_timestamp(ts), "2024-05-20T01:00:00Z");
    }

    #[test]
    fn parses_naive_and_date_only_forms() {
        assert_eq!(
            format_timestamp(parse_timestamp("2024-05-20 10:30:00").unwrap()),
            "2024-05-20T10:30:00Z"
        );
        assert_eq!(
            format_timestamp(parse_timestamp("2024-05-20").unwrap()),
            "2024-05-20T00:00:00Z"
        );
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn hundredths_round_trip_two_decimals() {
        assert_eq!(to_hundredths(4.57), 457);
        assert_eq!(from_hundredths(457), 4.57);
    }

    #[test]
    fn dates_serialize_as_iso_strings() {
        let value = to_json_value(&parse_date("2024-05-20T09:00:00").unwrap());
        assert_eq!(value, Value::String("2024-05-20".to_string()));
    }
}
