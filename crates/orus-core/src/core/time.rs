// crates/orus-core/src/core/time.rs
// ============================================================================
// Module: ORUS Time
// Description: Second-precision timestamps and injectable clocks.
// Purpose: Stamp readings and parse query bounds in one canonical text form.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Timestamps travel as `YYYY-MM-DD HH:MM:SS` text in UTC. The same text is
//! stored in the `TIMESTAMP` column, so lexical order in the store matches
//! chronological order. Clocks are injected through [`Clock`] so ingestion and
//! query clamping are deterministic in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Human-readable form of the canonical timestamp layout.
pub const TIMESTAMP_FORMAT: &str = "YYYY-MM-DD HH:MM:SS";

/// Parsed layout for [`TIMESTAMP_FORMAT`].
const LAYOUT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp parse/format failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Input did not match [`TIMESTAMP_FORMAT`].
    #[error("expected {TIMESTAMP_FORMAT}, got {0:?}")]
    Parse(String),
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// UTC timestamp with second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(PrimitiveDateTime);

impl Timestamp {
    /// Parses a `YYYY-MM-DD HH:MM:SS` string.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Parse`] when the input does not match.
    pub fn parse(value: &str) -> Result<Self, TimestampError> {
        PrimitiveDateTime::parse(value, LAYOUT)
            .map(Self)
            .map_err(|_| TimestampError::Parse(value.to_string()))
    }

    /// Truncates an offset date-time to UTC seconds.
    #[must_use]
    pub fn from_offset(value: OffsetDateTime) -> Self {
        let utc = value.to_offset(time::UtcOffset::UTC);
        let truncated = utc.replace_nanosecond(0).unwrap_or(utc);
        Self(PrimitiveDateTime::new(truncated.date(), truncated.time()))
    }

    /// Returns the canonical text form.
    #[must_use]
    pub fn to_text(&self) -> String {
        // Format only fails for descriptions needing an offset; LAYOUT has none.
        self.0.format(LAYOUT).unwrap_or_default()
    }

    /// Returns the earlier of two timestamps.
    #[must_use]
    pub fn min_of(self, other: Self) -> Self {
        if self <= other { self } else { other }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Source of "now" for ingestion stamping and query clamping.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time truncated to seconds.
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_offset(OffsetDateTime::now_utc())
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
