// Utility functions
use chrono::{DateTime, Datelike, SecondsFormat, Utc};

/// Formats a timestamp as fixed-width RFC 3339 UTC text, so that stored
/// values sort lexically in time order.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Converts a string into `DateTime<Utc>`, if possible.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Converts Unix seconds into `DateTime<Utc>`; `None` outside years 0..=9999,
/// which stored timestamps cannot represent as fixed-width text.
pub fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).filter(|dt| (0..=9999).contains(&dt.year()))
}
