// crates/orus-core/src/interfaces/mod.rs
// ============================================================================
// Module: ORUS Interfaces
// Description: Backend-agnostic metric store contract.
// Purpose: Define the persistence surface used by ingestion and queries.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`MetricStore`] is the persistence gateway. Implementations own their
//! connections exclusively, bind every value as a statement parameter, and
//! only interpolate validated [`TableId`]s.
//!
//! Security posture: table identifiers reaching a store have already passed
//! the allow-list; device identifiers and values are untrusted and must be
//! bound, never formatted into SQL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::ColumnName;
use crate::core::DeviceId;
use crate::core::MetricValue;
use crate::core::QueryFilter;
use crate::core::Row;
use crate::core::TableId;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Metric store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connecting to the store failed.
    #[error("metric store connection error: {0}")]
    Connection(String),
    /// Filesystem error around the store.
    #[error("metric store io error: {0}")]
    Io(String),
    /// The database rejected a statement.
    #[error("metric store database error: {0}")]
    Db(String),
    /// A metric table has no registered metric type.
    #[error("metric store schema drift: {0}")]
    SchemaDrift(String),
    /// Stored data could not be mapped.
    #[error("metric store invalid data: {0}")]
    Invalid(String),
    /// The store was closed.
    #[error("metric store is closed")]
    Closed,
}

// ============================================================================
// SECTION: Metric Store
// ============================================================================

/// Persistence gateway for devices and metric readings.
pub trait MetricStore {
    /// Lists every table name in the store, registry tables included.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when introspection fails.
    fn list_tables(&self) -> Result<Vec<String>, StoreError>;

    /// Lists the columns of `table` in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when introspection fails.
    fn list_columns(&self, table: &TableId) -> Result<Vec<ColumnName>, StoreError>;

    /// Registers `device` unless it is already known. Never fails on duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn register_device_if_absent(
        &self,
        device: &DeviceId,
        seen_at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Writes one reading and commits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SchemaDrift`] when the metric type is not
    /// registered, or another [`StoreError`] when the insert fails.
    fn write_reading(
        &self,
        device: &DeviceId,
        reading: &MetricValue,
        timestamp: Timestamp,
    ) -> Result<(), StoreError>;

    /// Writes every reading of one message in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when any insert fails; nothing is committed.
    fn write_readings(
        &self,
        device: &DeviceId,
        readings: &[MetricValue],
        timestamp: Timestamp,
    ) -> Result<(), StoreError>;

    /// Reads rows of `filter.table` in `TIMESTAMP, ID` order, at most `max_rows`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn query(&self, filter: &QueryFilter, max_rows: u32) -> Result<Vec<Row>, StoreError>;

    /// Creates the registry tables and `tables` idempotently.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when DDL fails.
    fn bootstrap_schema(&self, tables: &[TableId]) -> Result<(), StoreError>;

    /// Reports store readiness for health checks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Releases connections. Later calls fail with [`StoreError::Closed`].
    fn close(&self) {}
}
