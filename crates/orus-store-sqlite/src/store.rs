// crates/orus-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Metric Store
// Description: Durable MetricStore backed by SQLite WAL.
// Purpose: Persist devices and per-metric readings with bounded reads.
// Dependencies: orus-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This module implements [`MetricStore`] using `SQLite`. The registry tables
//! (`DEVICES`, `METRIC_TYPES`) and one table per metric follow the shared
//! physical layout; every statement text comes from `orus_core::statement`.
//! Writes commit immediately through a single mutex-guarded connection.
//! Reads use a round-robin pool of connections.
//!
//! Security posture: device identifiers and values are bound as parameters;
//! only validated table identifiers are interpolated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use orus_core::ColumnName;
use orus_core::DeviceId;
use orus_core::MetricStore;
use orus_core::MetricValue;
use orus_core::QueryFilter;
use orus_core::ReadStatement;
use orus_core::Row;
use orus_core::SqlDialect;
use orus_core::SqlParam;
use orus_core::StoreError;
use orus_core::StoredValue;
use orus_core::TableId;
use orus_core::Timestamp;
use orus_core::insert_reading_sql;
use orus_core::metric_table_ddl;
use orus_core::register_device_sql;
use orus_core::register_metric_type_sql;
use orus_core::registry_table_ddl;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::params;
use rusqlite::types::Value;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (milliseconds) for `SQLite` connections.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of the full store path.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` metric store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `read_pool_size` must be greater than zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Number of read connections.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default tuning.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
            read_pool_size: default_read_pool_size(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default read connection pool size.
const fn default_read_pool_size() -> usize {
    4
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages never embed bound values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Invalid configuration or stored data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Metric table has no metric-type row.
    #[error("sqlite store schema drift: {0}")]
    SchemaDrift(String),
    /// Store was closed.
    #[error("sqlite store is closed")]
    Closed,
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::SchemaDrift(message) => Self::SchemaDrift(message),
            SqliteStoreError::Closed => Self::Closed,
        }
    }
}

/// Maps a rusqlite error to a store error.
fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Mutex-guarded connection, emptied when the store closes.
type ConnectionSlot = Mutex<Option<Connection>>;

/// `SQLite`-backed metric store.
///
/// # Invariants
/// - All writes are serialized through `write_connection`.
/// - Every write commits before the call returns.
/// - `close` releases every connection; later calls fail with `Closed`.
#[derive(Clone)]
pub struct SqliteMetricStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared writer connection guarded by a mutex; `None` once closed.
    write_connection: Arc<ConnectionSlot>,
    /// Read connection pool; slots are emptied by `close`.
    read_connections: Arc<Vec<ConnectionSlot>>,
    /// Round-robin cursor for read connection selection.
    read_cursor: Arc<AtomicUsize>,
    /// Set once `close` is called.
    closed: Arc<AtomicBool>,
}

impl SqliteMetricStore {
    /// Opens an `SQLite`-backed metric store.
    ///
    /// Connections opened before a failure are dropped with the error.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        if config.read_pool_size == 0 {
            return Err(SqliteStoreError::Invalid(
                "read_pool_size must be greater than zero".to_string(),
            ));
        }
        ensure_parent_dir(&config.path)?;
        let write_connection = open_connection(&config)?;
        let mut read_connections = Vec::with_capacity(config.read_pool_size);
        for _ in 0 .. config.read_pool_size {
            read_connections.push(Mutex::new(Some(open_connection(&config)?)));
        }
        info!(path = %config.path.display(), readers = config.read_pool_size, "opened sqlite metric store");
        Ok(Self {
            config,
            write_connection: Arc::new(Mutex::new(Some(write_connection))),
            read_connections: Arc::new(read_connections),
            read_cursor: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Runs `f` on the next read connection in round-robin order.
    fn with_reader<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        self.ensure_open()?;
        let len = self.read_connections.len();
        let index = self.read_cursor.fetch_add(1, Ordering::Relaxed) % len;
        let guard = self.read_connections[index]
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite read mutex poisoned".to_string()))?;
        f(guard.as_ref().ok_or(SqliteStoreError::Closed)?)
    }

    /// Runs `f` on the writer connection.
    fn with_writer<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        self.ensure_open()?;
        let mut guard = self
            .write_connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite write mutex poisoned".to_string()))?;
        f(guard.as_mut().ok_or(SqliteStoreError::Closed)?)
    }

    /// Fails once the store is closed.
    fn ensure_open(&self) -> Result<(), SqliteStoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SqliteStoreError::Closed);
        }
        Ok(())
    }

    /// Verifies the store can execute a simple SQL statement.
    fn check_connection(&self) -> Result<(), SqliteStoreError> {
        self.with_reader(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(|err| db_error(&err))?;
            Ok(())
        })
    }

    /// Lists tables via `sqlite_master`.
    fn table_names(&self) -> Result<Vec<String>, SqliteStoreError> {
        self.with_reader(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE \
                     'sqlite_%' ORDER BY name",
                )
                .map_err(|err| db_error(&err))?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|err| db_error(&err))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| db_error(&err))?;
            Ok(names)
        })
    }

    /// Lists columns of `table` in declaration order.
    fn column_names(&self, table: &TableId) -> Result<Vec<ColumnName>, SqliteStoreError> {
        self.with_reader(|conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
                .map_err(|err| db_error(&err))?;
            let columns = stmt
                .query_map(params![table.as_str()], |row| {
                    row.get::<_, String>(0).map(ColumnName::new)
                })
                .map_err(|err| db_error(&err))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| db_error(&err))?;
            Ok(columns)
        })
    }

    /// Runs a bounded read.
    fn read_rows(&self, filter: &QueryFilter, max_rows: u32) -> Result<Vec<Row>, SqliteStoreError> {
        let statement = ReadStatement::build(SqlDialect::Sqlite, filter, max_rows);
        let params: Vec<Value> = statement.params.iter().map(to_sqlite_value).collect();
        let rows = self.with_reader(|conn| {
            let mut stmt = conn.prepare(&statement.sql).map_err(|err| db_error(&err))?;
            let width = stmt.column_count();
            stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
                (0 .. width).map(|index| row.get_ref(index).map(from_sqlite_value)).collect()
            })
            .map_err(|err| db_error(&err))?
            .collect::<Result<Vec<Row>, _>>()
            .map_err(|err| db_error(&err))
        })?;
        debug!(table = %filter.table, rows = rows.len(), "sqlite read");
        Ok(rows)
    }

    /// Inserts the device unless present.
    fn insert_device(&self, device: &DeviceId, seen_at: Timestamp) -> Result<(), SqliteStoreError> {
        let inserted = self.with_writer(|conn| {
            conn.execute(
                &register_device_sql(SqlDialect::Sqlite),
                params![device.as_str(), seen_at.to_text()],
            )
            .map_err(|err| db_error(&err))
        })?;
        if inserted > 0 {
            info!(device = %device, "registered new device");
        }
        Ok(())
    }

    /// Writes readings in one transaction.
    fn insert_readings(
        &self,
        device: &DeviceId,
        readings: &[MetricValue],
        timestamp: Timestamp,
    ) -> Result<(), SqliteStoreError> {
        let at = timestamp.to_text();
        self.with_writer(|conn| {
            let tx = conn.transaction().map_err(|err| db_error(&err))?;
            for reading in readings {
                insert_one(&tx, device, reading, &at)?;
            }
            tx.commit().map_err(|err| db_error(&err))
        })
    }

    /// Creates registry and metric tables.
    fn create_schema(&self, tables: &[TableId]) -> Result<(), SqliteStoreError> {
        self.with_writer(|conn| {
            let tx = conn.transaction().map_err(|err| db_error(&err))?;
            for ddl in registry_table_ddl(SqlDialect::Sqlite) {
                tx.execute_batch(&ddl).map_err(|err| db_error(&err))?;
            }
            for table in tables.iter().filter(|table| !table.is_reserved()) {
                tx.execute_batch(&metric_table_ddl(SqlDialect::Sqlite, table))
                    .map_err(|err| db_error(&err))?;
                tx.execute(&register_metric_type_sql(SqlDialect::Sqlite), params![table.as_str()])
                    .map_err(|err| db_error(&err))?;
            }
            tx.commit().map_err(|err| db_error(&err))
        })?;
        info!(tables = tables.len(), "sqlite schema bootstrapped");
        Ok(())
    }
}

impl MetricStore for SqliteMetricStore {
    fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        self.table_names().map_err(StoreError::from)
    }

    fn list_columns(&self, table: &TableId) -> Result<Vec<ColumnName>, StoreError> {
        self.column_names(table).map_err(StoreError::from)
    }

    fn register_device_if_absent(
        &self,
        device: &DeviceId,
        seen_at: Timestamp,
    ) -> Result<(), StoreError> {
        self.insert_device(device, seen_at).map_err(StoreError::from)
    }

    fn write_reading(
        &self,
        device: &DeviceId,
        reading: &MetricValue,
        timestamp: Timestamp,
    ) -> Result<(), StoreError> {
        let at = timestamp.to_text();
        self.with_writer(|conn| insert_one(conn, device, reading, &at)).map_err(StoreError::from)
    }

    fn write_readings(
        &self,
        device: &DeviceId,
        readings: &[MetricValue],
        timestamp: Timestamp,
    ) -> Result<(), StoreError> {
        self.insert_readings(device, readings, timestamp).map_err(StoreError::from)
    }

    fn query(&self, filter: &QueryFilter, max_rows: u32) -> Result<Vec<Row>, StoreError> {
        self.read_rows(filter, max_rows).map_err(StoreError::from)
    }

    fn bootstrap_schema(&self, tables: &[TableId]) -> Result<(), StoreError> {
        self.create_schema(tables).map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.check_connection().map_err(StoreError::from)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut released = 0_usize;
        for slot in std::iter::once(&*self.write_connection).chain(self.read_connections.iter()) {
            match slot.lock() {
                Ok(mut guard) => {
                    if let Some(conn) = guard.take() {
                        if let Err((_, err)) = conn.close() {
                            warn!(error = %err, "sqlite connection close failed");
                        }
                        released += 1;
                    }
                }
                Err(_) => warn!("sqlite connection mutex poisoned during close"),
            }
        }
        info!(path = %self.config.path.display(), released, "closed sqlite metric store");
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Inserts one reading on `connection`; zero affected rows is schema drift.
fn insert_one(
    connection: &Connection,
    device: &DeviceId,
    reading: &MetricValue,
    timestamp: &str,
) -> Result<(), SqliteStoreError> {
    let inserted = connection
        .execute(
            &insert_reading_sql(SqlDialect::Sqlite, &reading.table),
            params![device.as_str(), reading.value, timestamp, reading.table.as_str()],
        )
        .map_err(|err| db_error(&err))?;
    if inserted == 0 {
        return Err(SqliteStoreError::SchemaDrift(format!(
            "metric type not registered: {}",
            reading.table
        )));
    }
    Ok(())
}

/// Converts a bound parameter.
fn to_sqlite_value(param: &SqlParam) -> Value {
    match param {
        SqlParam::Text(text) => Value::Text(text.clone()),
        SqlParam::Integer(value) => Value::Integer(*value),
    }
}

/// Converts a column value.
fn from_sqlite_value(value: ValueRef<'_>) -> StoredValue {
    match value {
        ValueRef::Null => StoredValue::Null,
        ValueRef::Integer(value) => StoredValue::Integer(value),
        ValueRef::Real(value) => StoredValue::Real(value),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            StoredValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies journal, sync, and busy-timeout settings.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}
