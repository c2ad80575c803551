use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Naive ISO 8601 layout written by older databases (no UTC offset).
const NAIVE_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A wall-clock instant stored in UTC.
///
/// Serializes as RFC 3339 with microsecond precision. Parsing also accepts
/// offset-less ISO 8601 strings, which are interpreted in the local time
/// zone.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current instant.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap an existing UTC datetime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// The underlying UTC datetime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// RFC 3339 rendering used on disk.
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Parse an RFC 3339 or naive ISO 8601 string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }

        let naive = NaiveDateTime::parse_from_str(s, NAIVE_LAYOUT)
            .map_err(|e| TypeError::InvalidTimestamp(format!("{s:?}: {e}")))?;
        // A naive time inside a DST gap has no local mapping; fall back to UTC.
        let utc = match Local.from_local_datetime(&naive).earliest() {
            Some(local) => local.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&naive),
        };
        Ok(Self(utc))
    }
}

impl FromStr for Timestamp {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.to_iso8601())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = Timestamp::parse("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(ts.as_datetime().hour(), 10);
        assert_eq!(ts.as_datetime().day(), 1);
    }

    #[test]
    fn parses_naive_iso_with_fraction() {
        let ts = Timestamp::parse("2024-01-15T10:30:00.123456").unwrap();
        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts.as_datetime().nanosecond() / 1_000, 123_456);
    }

    #[test]
    fn parses_naive_iso_without_fraction() {
        assert!(Timestamp::parse("2024-01-15T10:30:00").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        let err = Timestamp::parse("last tuesday").unwrap_err();
        assert!(matches!(err, TypeError::InvalidTimestamp(_)));
    }

    #[test]
    fn iso_rendering_is_utc_micros() {
        let ts = Timestamp::parse("2024-01-15T10:30:00.5Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2024-01-15T10:30:00.500000Z");
    }

    #[test]
    fn serde_roundtrip() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        // Rendering truncates to microseconds.
        assert_eq!(parsed.to_iso8601(), ts.to_iso8601());
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::parse("2024-01-01T00:00:00Z").unwrap();
        let b = Timestamp::parse("2024-01-02T00:00:00Z").unwrap();
        assert!(a < b);
    }

    #[test]
    fn display_format() {
        let ts = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(format!("{ts}"), "2024-01-15 10:30:00 UTC");
    }
}
