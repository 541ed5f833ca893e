// aegi-core/src/time.rs
// ============================================================================
// Module: AEGI Timestamps
// Description: Canonical timestamp wrapper used across the data model.
// Purpose: Serialize timestamps as RFC 3339 strings and expose ordering/arithmetic
//          without leaking a specific datetime crate into every call site.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! All `created_at`/`trigger_time`/etc. fields in §3 use [`Timestamp`]. It
//! wraps `time::OffsetDateTime` so comparisons (`<`, `<=`) used by the
//! narrative builder's time-window clustering and the causal reasoner's
//! temporal-consistency check are available directly.

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A point in time, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Wraps an existing `OffsetDateTime`.
    #[must_use]
    pub fn new(value: OffsetDateTime) -> Self {
        Self(value)
    }

    /// Returns the underlying `OffsetDateTime`.
    #[must_use]
    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    /// Seconds elapsed between `self` and `other` (positive when `self` is later).
    #[must_use]
    pub fn seconds_since(self, other: Timestamp) -> f64 {
        (self.0 - other.0).as_seconds_f64()
    }

    /// Hours elapsed between `self` and `other` (positive when `self` is later).
    #[must_use]
    pub fn hours_since(self, other: Timestamp) -> f64 {
        self.seconds_since(other) / 3600.0
    }

    /// Unix timestamp in whole seconds, used for dedup-key composition (§4.3).
    #[must_use]
    pub fn unix_seconds(self) -> i64 {
        self.0.unix_timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0.unix_timestamp()),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self
            .0
            .format(&Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let parsed = OffsetDateTime::parse(&text, &Rfc3339).map_err(serde::de::Error::custom)?;
        Ok(Self(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn hours_since_is_positive_forward() {
        let base = Timestamp::new(OffsetDateTime::now_utc());
        let later = Timestamp::new(base.into_inner() + Duration::hours(2));
        assert!((later.hours_since(base) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn serde_roundtrip() {
        let ts = Timestamp::new(OffsetDateTime::now_utc().replace_nanosecond(0).expect("trunc"));
        let json = serde_json::to_string(&ts).expect("serialize");
        let back: Timestamp = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(ts, back);
    }
}
