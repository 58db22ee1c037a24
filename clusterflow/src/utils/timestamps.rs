//! Timestamp parsing and the trusted clock used for expiry decisions.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, TimeZone, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Errors that can occur during timestamp parsing.
#[derive(Debug, Error)]
pub enum TimestampError {
    /// The timestamp string is empty.
    #[error("Empty timestamp string")]
    EmptyString,

    /// The timestamp value is invalid.
    #[error("Invalid timestamp: {0}")]
    InvalidFormat(String),
}

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Parses a record timestamp.
///
/// Records carry RFC 3339 strings (`2016-01-20T18:49:02.712Z`). Older
/// exports sometimes drop the offset, and some tooling writes Unix seconds;
/// both are accepted and interpreted as UTC.
///
/// # Errors
///
/// Returns `TimestampError` if the input cannot be parsed.
pub fn parse_timestamp(input: &str) -> Result<Timestamp, TimestampError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(TimestampError::EmptyString);
    }

    if let Ok(secs) = trimmed.parse::<i64>() {
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| TimestampError::InvalidFormat(trimmed.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    for fmt in formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(TimestampError::InvalidFormat(trimmed.to_string()))
}

/// Formats a timestamp the way records store it.
#[must_use]
pub fn format_timestamp(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Converts a std duration to a chrono duration, saturating on overflow.
#[must_use]
pub fn to_chrono(duration: Duration) -> ChronoDuration {
    ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::MAX)
}

/// Returns `at + duration`, clamped to the latest representable time.
#[must_use]
pub fn add_duration(at: Timestamp, duration: Duration) -> Timestamp {
    at.checked_add_signed(to_chrono(duration))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// A source of the current time.
///
/// Cache expiry is always evaluated against a `Clock` owned by the server,
/// never against times supplied by a client.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now_utc()
    }
}

/// A clock that only moves when told to. Used by tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now = add_duration(*now, by);
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, to: Timestamp) {
        *self.now.write() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(now_utc())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_timestamp("2016-01-20T18:49:02.712Z").unwrap();
        assert_eq!(dt.year(), 2016);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.hour(), 18);
    }

    #[test]
    fn test_parse_offset_is_normalized_to_utc() {
        let dt = parse_timestamp("2016-01-20T20:49:02+02:00").unwrap();
        assert_eq!(dt.hour(), 18);
    }

    #[test]
    fn test_parse_naive_and_unix() {
        let naive = parse_timestamp("2016-01-20 18:49:02").unwrap();
        assert_eq!(naive.minute(), 49);

        let unix = parse_timestamp("1453315742").unwrap();
        assert_eq!(unix.year(), 2016);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_timestamp(""), Err(TimestampError::EmptyString)));
        assert!(matches!(
            parse_timestamp("last tuesday"),
            Err(TimestampError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_format_roundtrips_through_parse() {
        let dt = parse_timestamp("2016-01-20T18:49:02.712Z").unwrap();
        assert_eq!(format_timestamp(&dt), "2016-01-20T18:49:02.712Z");
    }

    #[test]
    fn test_add_duration_saturates() {
        let start = parse_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(
            add_duration(start, Duration::from_secs(60)),
            parse_timestamp("2024-01-15T10:31:00Z").unwrap()
        );
        assert_eq!(
            add_duration(start, Duration::from_secs(100_000_000_000_000)),
            DateTime::<Utc>::MAX_UTC
        );
        assert_eq!(add_duration(start, Duration::MAX), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = parse_timestamp("2020-01-01T00:00:00Z").unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), start + ChronoDuration::seconds(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
