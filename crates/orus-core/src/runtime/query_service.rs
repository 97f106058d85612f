// crates/orus-core/src/runtime/query_service.rs
// ============================================================================
// Module: ORUS Query Service
// Description: Validates client filters and executes bounded reads.
// Purpose: Turn untrusted query arguments into safe, field-named results.
// Dependencies: thiserror, tracing, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Request handling runs a fixed gate sequence: required table id, sanitizer
//! on every present value, allow-list membership, then date parsing with
//! future bounds clamped to the current time. Only a filter that clears every
//! gate reaches the store.
//!
//! Security posture: request arguments are untrusted; the store is never
//! touched for a rejected filter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::core::Clock;
use crate::core::KnownTables;
use crate::core::QueryFilter;
use crate::core::QueryResult;
use crate::core::RawFilter;
use crate::core::Record;
use crate::core::TIMESTAMP_FORMAT;
use crate::core::TimeRange;
use crate::core::Timestamp;
use crate::interfaces::MetricStore;
use crate::interfaces::StoreError;
use crate::runtime::sanitizer::SanitizeError;
use crate::runtime::sanitizer::sanitize;
use crate::runtime::store::SharedMetricStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default cap on rows returned by one read.
pub const DEFAULT_MAX_ROWS: u32 = 10_000;

/// Request field carrying the table identifier.
const TABLE_ID_FIELD: &str = "table_id";
/// Request field carrying the lower bound.
const START_DATE_FIELD: &str = "start_date";
/// Request field carrying the upper bound.
const END_DATE_FIELD: &str = "end_date";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Per-request failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// `table_id` was absent or empty.
    #[error("table_id is required")]
    MissingTableId,
    /// A filter value contained a forbidden pattern.
    #[error("{field} contains forbidden pattern {pattern:?}")]
    InjectionRejected {
        /// Request field name.
        field: &'static str,
        /// Matched pattern.
        pattern: &'static str,
    },
    /// `table_id` is not an allow-listed metric table.
    #[error("unknown table {0:?}")]
    UnknownTable(String),
    /// A date bound did not match the timestamp layout.
    #[error("{field} must use the format {TIMESTAMP_FORMAT}, got {value:?}")]
    BadDateFormat {
        /// Request field name.
        field: &'static str,
        /// Rejected value.
        value: String,
    },
    /// The store failed while serving the read.
    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl ServiceError {
    /// Returns true for errors caused by the request rather than the store.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::StoreFailure(_))
    }
}

// ============================================================================
// SECTION: Query Service
// ============================================================================

/// Query service over a shared metric store.
#[derive(Clone)]
pub struct QueryService {
    /// Backing store.
    store: SharedMetricStore,
    /// Allow-listed metric tables.
    tables: KnownTables,
    /// Source of "now" for clamping future bounds.
    clock: Arc<dyn Clock>,
    /// Row cap per read.
    max_rows: u32,
}

impl QueryService {
    /// Creates a query service with the default row cap.
    #[must_use]
    pub fn new(store: SharedMetricStore, tables: KnownTables, clock: Arc<dyn Clock>) -> Self {
        Self { store, tables, clock, max_rows: DEFAULT_MAX_ROWS }
    }

    /// Overrides the row cap.
    #[must_use]
    pub const fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Returns the allow-list.
    #[must_use]
    pub const fn tables(&self) -> &KnownTables {
        &self.tables
    }

    /// Validates `raw` without touching the store.
    ///
    /// # Errors
    ///
    /// Returns the first failing gate as a [`ServiceError`].
    pub fn validate(&self, raw: &RawFilter) -> Result<QueryFilter, ServiceError> {
        let table_id = present(raw.table_id.as_deref()).ok_or(ServiceError::MissingTableId)?;
        let start = present(raw.start_date.as_deref());
        let end = present(raw.end_date.as_deref());

        screen(TABLE_ID_FIELD, Some(table_id))?;
        screen(START_DATE_FIELD, start)?;
        screen(END_DATE_FIELD, end)?;

        let table = self
            .tables
            .get(table_id)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownTable(table_id.to_string()))?;

        let now = self.clock.now();
        let start = start.map(|value| parse_bound(START_DATE_FIELD, value, now)).transpose()?;
        let end = end.map(|value| parse_bound(END_DATE_FIELD, value, now)).transpose()?;
        Ok(QueryFilter { table, range: TimeRange::from_bounds(start, end) })
    }

    /// Validates `raw`, reads the table, and zips rows with column names.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for rejected filters and store failures.
    pub fn handle(&self, raw: &RawFilter) -> Result<QueryResult, ServiceError> {
        let filter = self.validate(raw)?;
        let rows = self.store.query(&filter, self.max_rows)?;
        let columns = self.store.list_columns(&filter.table)?;
        let records = rows
            .into_iter()
            .map(|row| {
                let width = row.len();
                Record::zip(&columns, row).ok_or_else(|| {
                    StoreError::Invalid(format!(
                        "row width {width} does not match {} columns of {}",
                        columns.len(),
                        filter.table
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(table = %filter.table, rows = records.len(), "served readings query");
        Ok(QueryResult(records))
    }
}

/// Treats empty strings as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// Runs the sanitizer over one optional field.
fn screen(field: &'static str, value: Option<&str>) -> Result<(), ServiceError> {
    value.map_or(Ok(()), |value| {
        sanitize(value).map_err(|SanitizeError::InjectionDetected { pattern }| {
            ServiceError::InjectionRejected { field, pattern }
        })
    })
}

/// Parses one date bound and clamps it to `now`.
fn parse_bound(field: &'static str, value: &str, now: Timestamp) -> Result<Timestamp, ServiceError> {
    Timestamp::parse(value)
        .map(|ts| ts.min_of(now))
        .map_err(|_| ServiceError::BadDateFormat { field, value: value.to_string() })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
