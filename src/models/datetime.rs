//! Timestamp input handling
//!
//! The admin front end sends either full RFC 3339 timestamps or the value of
//! an `<input type="datetime-local">`, which has no zone. Zone-less values are
//! read in the configured display offset.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};

use crate::error::{AppError, AppResult};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A timestamp as received on the wire, before its zone is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDateTime {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl InputDateTime {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(InputDateTime::Aware(dt));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(InputDateTime::Naive)
            .ok_or_else(|| format!("invalid datetime '{}', expected ISO 8601", s))
    }

    /// Convert to UTC, reading zone-less values in `local`
    ///
    /// Fails when shifting a naive value leaves chrono's representable range.
    pub fn resolve(&self, local: FixedOffset) -> AppResult<DateTime<Utc>> {
        match self {
            InputDateTime::Aware(dt) => Ok(dt.with_timezone(&Utc)),
            InputDateTime::Naive(naive) => {
                let shift = Duration::seconds(local.local_minus_utc() as i64);
                naive
                    .checked_sub_signed(shift)
                    .map(|utc| Utc.from_utc_datetime(&utc))
                    .ok_or_else(|| {
                        AppError::Validation(format!("datetime {} is out of range", naive))
                    })
            }
        }
    }
}

impl From<DateTime<Utc>> for InputDateTime {
    fn from(dt: DateTime<Utc>) -> Self {
        InputDateTime::Aware(dt.fixed_offset())
    }
}

impl<'de> Deserialize<'de> for InputDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = InputDateTime;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an ISO 8601 datetime string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                InputDateTime::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}

/// Build a fixed offset from whole hours east of UTC
pub fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brasilia() -> FixedOffset {
        offset_from_hours(-3).unwrap()
    }

    #[test]
    fn test_rfc3339_with_z() {
        let parsed = InputDateTime::parse("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(
            parsed.resolve(brasilia()).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let parsed = InputDateTime::parse("2024-01-01T09:00:00-03:00").unwrap();
        assert_eq!(
            parsed.resolve(FixedOffset::east_opt(0).unwrap()).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_datetime_local_input_uses_display_offset() {
        let parsed = InputDateTime::parse("2024-01-01T09:30").unwrap();
        assert!(matches!(parsed, InputDateTime::Naive(_)));
        assert_eq!(
            parsed.resolve(brasilia()).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_far_future_local_input_is_out_of_range() {
        let parsed = InputDateTime::parse("+262142-12-31T23:00").unwrap();
        assert!(matches!(
            parsed.resolve(brasilia()),
            Err(AppError::Validation(_))
        ));
        // No shift, no overflow
        assert!(parsed.resolve(FixedOffset::east_opt(0).unwrap()).is_ok());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(InputDateTime::parse("yesterday").is_err());
        assert!(serde_json::from_str::<InputDateTime>("12").is_err());
    }
}
