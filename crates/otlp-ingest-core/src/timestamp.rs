//! Timestamp conversion helpers.
//!
//! OTLP carries nanoseconds since the Unix epoch; flat records carry
//! millisecond-resolution UTC wall time rendered as RFC 3339.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Convert OTLP nanoseconds to millisecond wall time.
///
/// Zero is the OTLP "unset" value and maps to `None`. Every other `u64`
/// lands before the year 2555 and converts.
pub fn nanos_to_datetime(nanos: u64) -> Option<DateTime<Utc>> {
    if nanos == 0 {
        return None;
    }
    let millis = i64::try_from(nanos / NANOS_PER_MILLI).ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Convert fractional epoch seconds (Fluent Bit's `date` field) to wall time.
pub fn epoch_seconds_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    DateTime::from_timestamp_millis((seconds * 1_000.0).round() as i64)
}

/// Render a timestamp as RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_millis(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for record timestamps.
pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_millis(timestamp))
}
