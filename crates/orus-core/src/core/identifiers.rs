// crates/orus-core/src/core/identifiers.rs
// ============================================================================
// Module: ORUS Identifiers
// Description: Device, metric table, and column identifiers.
// Purpose: Provide strongly typed identifiers with validated wire forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Identifiers used across ingestion and query paths. [`TableId`] is the only
//! identifier ever interpolated into SQL text, so its constructor enforces a
//! strict character set; every other value reaches the store as a bound
//! statement parameter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Registry table holding one row per known device.
pub const DEVICES_TABLE: &str = "DEVICES";
/// Lookup table mapping metric table names to metric-type identifiers.
pub const METRIC_TYPES_TABLE: &str = "METRIC_TYPES";
/// Maximum length of a metric table identifier.
pub const MAX_TABLE_ID_LENGTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier was empty.
    #[error("table identifier must not be empty")]
    Empty,
    /// Identifier exceeded [`MAX_TABLE_ID_LENGTH`].
    #[error("table identifier exceeds {MAX_TABLE_ID_LENGTH} characters")]
    TooLong,
    /// Identifier contained a character outside `[A-Za-z0-9_]`.
    #[error("table identifier contains invalid character {0:?}")]
    InvalidCharacter(char),
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Device identifier (`CHIP_ID` column, `CLIENT_ID` message key).
///
/// # Invariants
/// - Opaque UTF-8 string; emptiness is rejected by the normalizer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a new device identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metric table identifier (one table per measurement type).
///
/// # Invariants
/// - Non-empty, at most [`MAX_TABLE_ID_LENGTH`] characters.
/// - Only ASCII letters, digits, and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// Parses and validates a table identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the name violates the identifier rules.
    pub fn parse(name: &str) -> Result<Self, IdentifierError> {
        if name.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if name.len() > MAX_TABLE_ID_LENGTH {
            return Err(IdentifierError::TooLong);
        }
        if let Some(invalid) = name.chars().find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_'))
        {
            return Err(IdentifierError::InvalidCharacter(invalid));
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the device and metric-type registry tables.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.0 == DEVICES_TABLE || self.0 == METRIC_TYPES_TABLE
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TableId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Column name reported by table introspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnName(String);

impl ColumnName {
    /// Creates a new column name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the column name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn table_id_accepts_upper_snake_case() {
        let table = TableId::parse("AIR_QUALITY_2").expect("valid table");
        assert_eq!(table.as_str(), "AIR_QUALITY_2");
        assert!(!table.is_reserved());
    }

    #[test]
    fn table_id_rejects_quotes_and_spaces() {
        assert_eq!(TableId::parse("TEMP\"; DROP"), Err(IdentifierError::InvalidCharacter('"')));
        assert_eq!(TableId::parse("TEMP ERATURE"), Err(IdentifierError::InvalidCharacter(' ')));
        assert_eq!(TableId::parse(""), Err(IdentifierError::Empty));
        assert_eq!(
            TableId::parse(&"A".repeat(MAX_TABLE_ID_LENGTH + 1)),
            Err(IdentifierError::TooLong)
        );
    }

    #[test]
    fn registry_tables_are_reserved() {
        assert!(TableId::parse(DEVICES_TABLE).unwrap().is_reserved());
        assert!(TableId::parse(METRIC_TYPES_TABLE).unwrap().is_reserved());
    }

    #[test]
    fn table_id_deserialize_validates() {
        let ok: TableId = serde_json::from_str("\"HUMIDITY\"").unwrap();
        assert_eq!(ok.as_str(), "HUMIDITY");
        assert!(serde_json::from_str::<TableId>("\"HUM-IDITY\"").is_err());
    }
}
