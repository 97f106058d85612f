// crates/orus-core/src/core/query.rs
// ============================================================================
// Module: ORUS Query Types
// Description: Client filters, time ranges, and field-named query results.
// Purpose: Shape reads between the HTTP surface, the query service, and stores.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RawFilter`] is the untrusted request form. The query service turns it
//! into a [`QueryFilter`] holding a validated [`TableId`] and a [`TimeRange`].
//! Stores answer with positional [`Row`]s that the service zips with the
//! table's column names into [`Record`]s.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::core::identifiers::ColumnName;
use crate::core::identifiers::TableId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Filters
// ============================================================================

/// Unvalidated query request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFilter {
    /// Target metric table.
    #[serde(default)]
    pub table_id: Option<String>,
    /// Inclusive lower bound.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive upper bound; only honored together with `start_date`.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl RawFilter {
    /// Builds a filter for `table_id` with no bounds.
    #[must_use]
    pub fn table(table_id: impl Into<String>) -> Self {
        Self { table_id: Some(table_id.into()), start_date: None, end_date: None }
    }

    /// Sets the lower bound.
    #[must_use]
    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end_date = Some(end.into());
        self
    }
}

/// Time bounds of a read.
///
/// There is no upper-bound-only case: an end without a start is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// Full scan.
    Unbounded,
    /// `TIMESTAMP >= start`.
    From(Timestamp),
    /// `start <= TIMESTAMP <= end`.
    Between(Timestamp, Timestamp),
}

impl TimeRange {
    /// Applies the three-case bound rule.
    #[must_use]
    pub const fn from_bounds(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        match (start, end) {
            (None, _) => Self::Unbounded,
            (Some(start), None) => Self::From(start),
            (Some(start), Some(end)) => Self::Between(start, end),
        }
    }

    /// Returns true when `ts` falls inside the range.
    #[must_use]
    pub fn contains(&self, ts: &Timestamp) -> bool {
        match self {
            Self::Unbounded => true,
            Self::From(start) => ts >= start,
            Self::Between(start, end) => ts >= start && ts <= end,
        }
    }
}

/// Validated query filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    /// Allow-listed target table.
    pub table: TableId,
    /// Time bounds.
    pub range: TimeRange,
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Column value as returned by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// SQL NULL.
    Null,
    /// Integer column.
    Integer(i64),
    /// Floating-point column.
    Real(f64),
    /// Text column.
    Text(String),
}

/// Positional row in table column order.
pub type Row = Vec<StoredValue>;

/// Field-named record preserving table column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Column/value pairs in column order.
    fields: Vec<(ColumnName, StoredValue)>,
}

impl Record {
    /// Zips column names with a positional row.
    ///
    /// Returns `None` when the widths differ.
    #[must_use]
    pub fn zip(columns: &[ColumnName], row: Row) -> Option<Self> {
        if columns.len() != row.len() {
            return None;
        }
        Some(Self { fields: columns.iter().cloned().zip(row).collect() })
    }

    /// Returns the value of `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&StoredValue> {
        self.fields.iter().find(|(name, _)| name.as_str() == column).map(|(_, value)| value)
    }

    /// Returns the column/value pairs in order.
    #[must_use]
    pub fn fields(&self) -> &[(ColumnName, StoredValue)] {
        &self.fields
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

/// Ordered query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryResult(pub Vec<Record>);

impl QueryResult {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no records matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
