//! Timestamp utilities
//!
//! Exported and mirrored timestamps use RFC 3339 with millisecond precision
//! and an explicit offset so they parse back to the same instant.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

/// Render a timestamp as RFC 3339 (e.g. `2026-10-15T08:30:00.250Z`)
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp with any offset back into UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Validation(format!("Invalid timestamp '{}': {}", value, e)))
}

/// Serde adapter that writes [`format_timestamp`] and reads through
/// [`parse_timestamp`]. Use with `#[serde(with = "crate::time::rfc3339")]`.
pub mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_has_offset_and_millis() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(format_timestamp(&ts), "2026-10-15T08:30:00.250Z");
    }

    #[test]
    fn test_parse_is_lossless_at_millisecond_precision() {
        let ts = Utc.timestamp_millis_opt(1_760_517_000_123).unwrap();
        let parsed = parse_timestamp(&format_timestamp(&ts)).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_parse_accepts_foreign_offset() {
        let parsed = parse_timestamp("2026-10-15T16:30:00+08:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_timestamp("yesterday"), Err(Error::Validation(_))));
    }
}
