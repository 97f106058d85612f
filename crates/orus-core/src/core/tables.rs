// crates/orus-core/src/core/tables.rs
// ============================================================================
// Module: ORUS Known Tables
// Description: Immutable allow-list of metric tables.
// Purpose: Gate message keys and query targets to introspected tables.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! The allow-list is built once at startup from store introspection and shared
//! read-only between the ingestion worker and request handlers. Cloning is a
//! reference-count bump.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::core::identifiers::TableId;

// ============================================================================
// SECTION: Known Tables
// ============================================================================

/// Shared allow-list of metric tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownTables(Arc<BTreeSet<TableId>>);

impl KnownTables {
    /// Builds the allow-list from validated identifiers, dropping registry tables.
    #[must_use]
    pub fn new(tables: impl IntoIterator<Item = TableId>) -> Self {
        Self(Arc::new(tables.into_iter().filter(|table| !table.is_reserved()).collect()))
    }

    /// Builds the allow-list from introspected names.
    ///
    /// Names that are not valid identifiers are skipped with a warning.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tables = names.into_iter().filter_map(|name| {
            let name = name.as_ref();
            match TableId::parse(name) {
                Ok(table) => Some(table),
                Err(err) => {
                    warn!(table = name, error = %err, "skipping table with unsupported name");
                    None
                }
            }
        });
        Self::new(tables)
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TableId> {
        self.0.iter().find(|table| table.as_str() == name)
    }

    /// Returns true when `name` is allow-listed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates tables in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TableId> {
        self.0.iter()
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no metric tables are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the table names in order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|table| table.as_str().to_string()).collect()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_names_skips_invalid_and_reserved() {
        let tables = KnownTables::from_names(["TEMPERATURE", "DEVICES", "bad name", "METRIC_TYPES", "CO2"]);
        assert_eq!(tables.names(), vec!["CO2".to_string(), "TEMPERATURE".to_string()]);
        assert!(tables.contains("CO2"));
        assert!(!tables.contains("DEVICES"));
        assert!(!tables.contains("temperature"));
    }

    #[test]
    fn clones_share_the_same_set() {
        let tables = KnownTables::from_names(["HUMIDITY"]);
        let clone = tables.clone();
        assert_eq!(tables, clone);
        assert_eq!(clone.len(), 1);
    }
}
