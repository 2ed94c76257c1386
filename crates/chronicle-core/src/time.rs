//! Millisecond-precision UTC timestamp handling.
//!
//! Event timestamps are truncated to millisecond precision — sub-millisecond
//! digits are zeroed, not rounded — so a record round-trips identically
//! through storage. Storage encoding is fixed-width RFC 3339, which keeps
//! string comparison equivalent to chronological comparison.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};

/// Zero the sub-millisecond digits of a timestamp (truncation, not rounding).
#[must_use]
pub fn truncate_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = dt.nanosecond() / 1_000_000 * 1_000_000;
    dt.with_nanosecond(nanos).unwrap_or(dt)
}

/// The current UTC time, truncated to millisecond precision.
#[must_use]
pub fn now_millis() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

/// Fixed-width RFC 3339 with millisecond precision (`2024-05-12T10:25:00.000Z`).
#[must_use]
pub fn to_rfc3339_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fixed-width RFC 3339 with microsecond precision, used for write stamps.
#[must_use]
pub fn to_rfc3339_micros(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Serde support for millisecond-precision UTC timestamps.
///
/// Serializes as fixed-width RFC 3339; deserialization truncates any
/// sub-millisecond digits the caller sent.
pub mod utc_millis {
    use super::{parse_rfc3339, to_rfc3339_millis, truncate_millis};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as RFC 3339 with millisecond precision.
    pub fn serialize<S: Serializer>(
        dt: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_rfc3339_millis(dt))
    }

    /// Deserialize from RFC 3339, truncating to millisecond precision.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_rfc3339(&s)
            .map(truncate_millis)
            .map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
