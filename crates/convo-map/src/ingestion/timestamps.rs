//! Timestamp normalization shared by the extraction strategies

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Numbers at or above this are epoch milliseconds, below it epoch seconds
const MILLIS_THRESHOLD: f64 = 10_000_000_000.0;

/// Epoch seconds (possibly fractional) to a UTC timestamp, millisecond precision
pub(crate) fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

/// Epoch number of unknown unit; exports mix seconds and milliseconds
pub(crate) fn from_epoch_number(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    if value >= MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(value.round() as i64)
    } else {
        from_epoch_seconds(value)
    }
}

/// Calendar date-time string; naive forms are taken as UTC
pub(crate) fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Loosely typed timestamp field: epoch number or date-time string
pub(crate) fn resolve_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_epoch_number),
        Value::String(s) => parse_datetime(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_and_millis_agree() {
        let secs = from_epoch_number(1_700_000_000.0).unwrap();
        let millis = from_epoch_number(1_700_000_000_000.0).unwrap();
        assert_eq!(secs, millis);
    }

    #[test]
    fn test_fractional_seconds() {
        let ts = from_epoch_seconds(1_700_000_000.25).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_250);
    }

    #[test]
    fn test_string_forms() {
        let expected = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_datetime("2024-03-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_datetime("2024-03-01T13:00:00+01:00"), Some(expected));
        assert_eq!(parse_datetime("2024-03-01 12:00:00"), Some(expected));
        assert_eq!(parse_datetime("2024-03-01T12:00:00.000"), Some(expected));
        assert!(parse_datetime("2024-03-01").is_some());
        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(from_epoch_number(f64::NAN).is_none());
        assert!(from_epoch_seconds(f64::INFINITY).is_none());
    }

    #[test]
    fn test_resolve_ignores_other_json_types() {
        use serde_json::json;

        assert_eq!(
            resolve_timestamp(&json!(1_700_000_000)),
            resolve_timestamp(&json!("2023-11-14T22:13:20Z"))
        );
        assert!(resolve_timestamp(&json!(true)).is_none());
        assert!(resolve_timestamp(&json!({"t": 1})).is_none());
        assert!(resolve_timestamp(&Value::Null).is_none());
    }
}
