//! ISO-8601 to epoch-millisecond conversion for date fields

use chrono::{DateTime, NaiveDateTime};
use tracing::warn;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Convert ISO-8601 text to milliseconds since the Unix epoch.
///
/// Offset-less timestamps are read as UTC, matching the layer's date time
/// reference. Empty or unparseable text yields `None`.
pub fn iso8601_to_epoch_ms(text: Option<&str>) -> Option<i64> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    warn!(timestamp = %text, "Unparseable timestamp, storing null");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_designator() {
        assert_eq!(iso8601_to_epoch_ms(Some("2024-09-27T08:14:44Z")), Some(1_727_424_884_000));
    }

    #[test]
    fn test_offset_and_fraction() {
        assert_eq!(
            iso8601_to_epoch_ms(Some("2024-09-27T03:14:44.250-05:00")),
            Some(1_727_424_884_250)
        );
    }

    #[test]
    fn test_naive_forms_are_utc() {
        assert_eq!(iso8601_to_epoch_ms(Some("2024-09-27 08:14:44")), Some(1_727_424_884_000));
        assert_eq!(iso8601_to_epoch_ms(Some("2024-09-27T08:14:44")), Some(1_727_424_884_000));
    }

    #[test]
    fn test_empty_or_garbage_is_none() {
        assert_eq!(iso8601_to_epoch_ms(None), None);
        assert_eq!(iso8601_to_epoch_ms(Some("   ")), None);
        assert_eq!(iso8601_to_epoch_ms(Some("yesterday")), None);
    }
}
