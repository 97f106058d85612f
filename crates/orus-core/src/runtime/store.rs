// crates/orus-core/src/runtime/store.rs
// ============================================================================
// Module: ORUS In-Memory Store
// Description: In-memory metric store and shared store wrapper.
// Purpose: Provide a deterministic store for tests and a clonable trait object.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryMetricStore`] mirrors the relational layout (registry plus one
//! table per metric) without external dependencies. It supports failure
//! injection and counts reads so tests can assert the store was never touched.
//! It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::core::ColumnName;
use crate::core::DEVICES_TABLE;
use crate::core::DeviceId;
use crate::core::METRIC_TYPES_TABLE;
use crate::core::MetricValue;
use crate::core::QueryFilter;
use crate::core::Row;
use crate::core::StoredValue;
use crate::core::TableId;
use crate::core::Timestamp;
use crate::interfaces::MetricStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Column layout shared by every metric table.
const METRIC_COLUMNS: [&str; 5] = ["ID", "CHIP_ID", "TYPE_ID", "VALUE", "TIMESTAMP"];

/// Stored reading.
#[derive(Debug, Clone)]
struct StoredReading {
    /// Row identifier.
    id: i64,
    /// Reporting device.
    device: DeviceId,
    /// Rounded value.
    value: f64,
    /// Receive time.
    timestamp: Timestamp,
}

/// Metric table contents.
#[derive(Debug, Default)]
struct MetricTableState {
    /// Registered metric-type id; `None` models schema drift.
    type_id: Option<i64>,
    /// Rows in insert order.
    rows: Vec<StoredReading>,
}

/// Mutable store contents.
#[derive(Debug, Default)]
struct StoreState {
    /// Registered devices and first-seen time.
    devices: BTreeMap<DeviceId, Timestamp>,
    /// Metric tables by name.
    tables: BTreeMap<TableId, MetricTableState>,
    /// Injected per-table write failures.
    failures: BTreeMap<TableId, StoreError>,
    /// Next row identifier.
    next_id: i64,
}

/// In-memory metric store for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMetricStore {
    /// Store contents protected by a mutex.
    state: Arc<Mutex<StoreState>>,
    /// Number of `query` calls served.
    queries: Arc<AtomicUsize>,
    /// Set once `close` is called.
    closed: Arc<AtomicBool>,
}

impl InMemoryMetricStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with `tables` bootstrapped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a name is not a valid table identifier.
    pub fn with_tables<I, S>(tables: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = tables
            .into_iter()
            .map(|name| {
                TableId::parse(name.as_ref()).map_err(|err| StoreError::Invalid(err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let store = Self::new();
        store.bootstrap_schema(&ids)?;
        Ok(store)
    }

    /// Adds a metric table with no metric-type row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lock is poisoned.
    pub fn add_unregistered_table(&self, table: TableId) -> Result<(), StoreError> {
        self.lock()?.tables.entry(table).or_default();
        Ok(())
    }

    /// Makes every write to `table` fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lock is poisoned.
    pub fn inject_write_failure(&self, table: TableId, error: StoreError) -> Result<(), StoreError> {
        self.lock()?.failures.insert(table, error);
        Ok(())
    }

    /// Returns the number of registered devices.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lock is poisoned.
    pub fn device_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.devices.len())
    }

    /// Returns the number of rows stored in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lock is poisoned.
    pub fn row_count(&self, table: &str) -> Result<usize, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .tables
            .iter()
            .find(|(id, _)| id.as_str() == table)
            .map_or(0, |(_, state)| state.rows.len()))
    }

    /// Returns how many reads reached the store.
    #[must_use]
    pub fn query_calls(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Locks the store state, failing once closed.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        self.state.lock().map_err(|_| StoreError::Io("metric store mutex poisoned".to_string()))
    }
}

/// Checks one reading against table state and injected failures.
fn check_writable(state: &StoreState, reading: &MetricValue) -> Result<i64, StoreError> {
    if let Some(error) = state.failures.get(&reading.table) {
        return Err(error.clone());
    }
    let table = state
        .tables
        .get(&reading.table)
        .ok_or_else(|| StoreError::Db(format!("no such table: {}", reading.table)))?;
    table.type_id.ok_or_else(|| {
        StoreError::SchemaDrift(format!("metric type not registered: {}", reading.table))
    })
}

/// Appends a reading whose table was already checked.
fn append(state: &mut StoreState, device: &DeviceId, reading: &MetricValue, timestamp: Timestamp) {
    state.next_id += 1;
    let id = state.next_id;
    if let Some(table) = state.tables.get_mut(&reading.table) {
        table.rows.push(StoredReading {
            id,
            device: device.clone(),
            value: reading.value,
            timestamp,
        });
    }
}

impl MetricStore for InMemoryMetricStore {
    fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let guard = self.lock()?;
        let mut names = vec![DEVICES_TABLE.to_string(), METRIC_TYPES_TABLE.to_string()];
        names.extend(guard.tables.keys().map(|table| table.as_str().to_string()));
        drop(guard);
        Ok(names)
    }

    fn list_columns(&self, table: &TableId) -> Result<Vec<ColumnName>, StoreError> {
        let guard = self.lock()?;
        if !guard.tables.contains_key(table) {
            return Ok(Vec::new());
        }
        drop(guard);
        Ok(METRIC_COLUMNS.iter().map(|name| ColumnName::new(*name)).collect())
    }

    fn register_device_if_absent(
        &self,
        device: &DeviceId,
        seen_at: Timestamp,
    ) -> Result<(), StoreError> {
        self.lock()?.devices.entry(device.clone()).or_insert(seen_at);
        Ok(())
    }

    fn write_reading(
        &self,
        device: &DeviceId,
        reading: &MetricValue,
        timestamp: Timestamp,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        check_writable(&guard, reading)?;
        append(&mut guard, device, reading, timestamp);
        drop(guard);
        Ok(())
    }

    fn write_readings(
        &self,
        device: &DeviceId,
        readings: &[MetricValue],
        timestamp: Timestamp,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        for reading in readings {
            check_writable(&guard, reading)?;
        }
        for reading in readings {
            append(&mut guard, device, reading, timestamp);
        }
        drop(guard);
        Ok(())
    }

    fn query(&self, filter: &QueryFilter, max_rows: u32) -> Result<Vec<Row>, StoreError> {
        let guard = self.lock()?;
        self.queries.fetch_add(1, Ordering::SeqCst);
        let table = guard
            .tables
            .get(&filter.table)
            .ok_or_else(|| StoreError::Db(format!("no such table: {}", filter.table)))?;
        let type_id = table.type_id.unwrap_or_default();
        let mut matched: Vec<&StoredReading> =
            table.rows.iter().filter(|row| filter.range.contains(&row.timestamp)).collect();
        matched.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        let limit = usize::try_from(max_rows).unwrap_or(usize::MAX);
        let rows = matched
            .into_iter()
            .take(limit)
            .map(|row| {
                vec![
                    StoredValue::Integer(row.id),
                    StoredValue::Text(row.device.as_str().to_string()),
                    StoredValue::Integer(type_id),
                    StoredValue::Real(row.value),
                    StoredValue::Text(row.timestamp.to_text()),
                ]
            })
            .collect();
        drop(guard);
        Ok(rows)
    }

    fn bootstrap_schema(&self, tables: &[TableId]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let mut next_type = guard.tables.values().filter_map(|table| table.type_id).max().unwrap_or(0);
        for table in tables.iter().filter(|table| !table.is_reserved()) {
            let state = guard.tables.entry(table.clone()).or_default();
            if state.type_id.is_none() {
                next_type += 1;
                state.type_id = Some(next_type);
            }
        }
        drop(guard);
        Ok(())
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared metric store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedMetricStore {
    /// Inner store implementation.
    inner: Arc<dyn MetricStore + Send + Sync>,
}

impl SharedMetricStore {
    /// Wraps a metric store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl MetricStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn MetricStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl MetricStore for SharedMetricStore {
    fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        self.inner.list_tables()
    }

    fn list_columns(&self, table: &TableId) -> Result<Vec<ColumnName>, StoreError> {
        self.inner.list_columns(table)
    }

    fn register_device_if_absent(
        &self,
        device: &DeviceId,
        seen_at: Timestamp,
    ) -> Result<(), StoreError> {
        self.inner.register_device_if_absent(device, seen_at)
    }

    fn write_reading(
        &self,
        device: &DeviceId,
        reading: &MetricValue,
        timestamp: Timestamp,
    ) -> Result<(), StoreError> {
        self.inner.write_reading(device, reading, timestamp)
    }

    fn write_readings(
        &self,
        device: &DeviceId,
        readings: &[MetricValue],
        timestamp: Timestamp,
    ) -> Result<(), StoreError> {
        self.inner.write_readings(device, readings, timestamp)
    }

    fn query(&self, filter: &QueryFilter, max_rows: u32) -> Result<Vec<Row>, StoreError> {
        self.inner.query(filter, max_rows)
    }

    fn bootstrap_schema(&self, tables: &[TableId]) -> Result<(), StoreError> {
        self.inner.bootstrap_schema(tables)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }

    fn close(&self) {
        self.inner.close();
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;
    use crate::core::TimeRange;

    fn ts(raw: &str) -> Timestamp {
        Timestamp::parse(raw).unwrap()
    }

    fn reading(table: &str, value: f64) -> MetricValue {
        MetricValue { table: TableId::parse(table).unwrap(), value }
    }

    #[test]
    fn device_registration_is_idempotent() {
        let store = InMemoryMetricStore::new();
        let device = DeviceId::new("dev1");
        store.register_device_if_absent(&device, ts("2024-01-01 00:00:00")).unwrap();
        store.register_device_if_absent(&device, ts("2024-01-02 00:00:00")).unwrap();
        assert_eq!(store.device_count().unwrap(), 1);
    }

    #[test]
    fn batch_write_is_all_or_nothing() {
        let store = InMemoryMetricStore::with_tables(["TEMPERATURE", "HUMIDITY"]).unwrap();
        store
            .inject_write_failure(TableId::parse("HUMIDITY").unwrap(), StoreError::Db("boom".into()))
            .unwrap();
        let result = store.write_readings(
            &DeviceId::new("dev1"),
            &[reading("TEMPERATURE", 1.0), reading("HUMIDITY", 2.0)],
            ts("2024-01-01 00:00:00"),
        );
        assert_eq!(result, Err(StoreError::Db("boom".into())));
        assert_eq!(store.row_count("TEMPERATURE").unwrap(), 0);
    }

    #[test]
    fn unregistered_table_reports_schema_drift() {
        let store = InMemoryMetricStore::new();
        store.add_unregistered_table(TableId::parse("CO2").unwrap()).unwrap();
        let result =
            store.write_reading(&DeviceId::new("d"), &reading("CO2", 1.0), ts("2024-01-01 00:00:00"));
        assert!(matches!(result, Err(StoreError::SchemaDrift(_))));
    }

    #[test]
    fn query_orders_and_limits() {
        let store = InMemoryMetricStore::with_tables(["TEMPERATURE"]).unwrap();
        let device = DeviceId::new("dev1");
        for (value, at) in [(3.0, "2024-01-03 00:00:00"), (1.0, "2024-01-01 00:00:00"), (2.0, "2024-01-02 00:00:00")] {
            store.write_reading(&device, &reading("TEMPERATURE", value), ts(at)).unwrap();
        }
        let filter = QueryFilter {
            table: TableId::parse("TEMPERATURE").unwrap(),
            range: TimeRange::From(ts("2024-01-02 00:00:00")),
        };
        let rows = store.query(&filter, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][3], StoredValue::Real(2.0));
        assert_eq!(store.query_calls(), 1);
    }

    #[test]
    fn closed_store_rejects_calls() {
        let store = SharedMetricStore::from_store(InMemoryMetricStore::new());
        store.close();
        assert_eq!(store.readiness(), Err(StoreError::Closed));
        assert_eq!(store.list_tables(), Err(StoreError::Closed));
    }
}
