// crates/orus-store-postgres/src/store.rs
// ============================================================================
// Module: Postgres Metric Store
// Description: Postgres-backed device registry and metric readings.
// Purpose: Provide pooled relational storage for multi-process deployments.
// Dependencies: orus-core, postgres, r2d2, r2d2_postgres, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`PostgresMetricStore`] implements [`MetricStore`] over an r2d2 pool. The
//! statement text is shared with the `SQLite` backend through
//! `orus_core::statement`; only placeholders and column types differ.
//! No statement timeout is configured, so server defaults apply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
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
use postgres::GenericClient;
use postgres::NoTls;
use postgres::types::ToSql;
use postgres::types::Type;
use r2d2::Pool;
use r2d2::PooledConnection;
use r2d2_postgres::PostgresConnectionManager;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Pooled connection type.
type PgConnection = PooledConnection<PostgresConnectionManager<NoTls>>;

/// Postgres store configuration.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct PostgresStoreConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Database name.
    pub database: String,
    /// Maximum pool size.
    pub max_connections: u32,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for PostgresStoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "orus".to_string(),
            password: String::new(),
            database: "orus".to_string(),
            max_connections: 16,
            connect_timeout_ms: 5_000,
        }
    }
}

impl fmt::Debug for PostgresStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresStoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

impl PostgresStoreConfig {
    /// Builds the driver configuration.
    #[must_use]
    pub fn client_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(&self.database)
            .application_name("orus")
            .connect_timeout(Duration::from_millis(self.connect_timeout_ms));
        config
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Postgres store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostgresStoreError {
    /// Pool or connection failure.
    #[error("postgres store connection error: {0}")]
    Connection(String),
    /// Statement failure.
    #[error("postgres store error: {0}")]
    Postgres(String),
    /// Invalid configuration or data.
    #[error("postgres store invalid data: {0}")]
    Invalid(String),
    /// Metric table has no metric-type row.
    #[error("postgres store schema drift: {0}")]
    SchemaDrift(String),
    /// Store was closed.
    #[error("postgres store is closed")]
    Closed,
}

impl From<PostgresStoreError> for StoreError {
    fn from(error: PostgresStoreError) -> Self {
        match error {
            PostgresStoreError::Connection(message) => Self::Connection(message),
            PostgresStoreError::Postgres(message) => Self::Db(message),
            PostgresStoreError::Invalid(message) => Self::Invalid(message),
            PostgresStoreError::SchemaDrift(message) => Self::SchemaDrift(message),
            PostgresStoreError::Closed => Self::Closed,
        }
    }
}

/// Maps a driver error.
fn pg_error(err: &postgres::Error) -> PostgresStoreError {
    PostgresStoreError::Postgres(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Postgres connection pool.
type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Postgres-backed metric store.
///
/// `close` takes the pool out of the store, so pooled connections are shut
/// down once in-flight borrows return.
pub struct PostgresMetricStore {
    /// Connection pool for Postgres access; `None` once closed.
    pool: Mutex<Option<PgPool>>,
    /// Set once `close` is called.
    closed: AtomicBool,
}

impl Drop for PostgresMetricStore {
    fn drop(&mut self) {
        if let Ok(slot) = self.pool.get_mut() {
            release_pool(slot.take());
        }
    }
}

impl PostgresMetricStore {
    /// Connects to Postgres and fills the pool.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresStoreError::Connection`] when the server is unreachable
    /// or rejects the credentials within the connect timeout.
    pub fn new(config: &PostgresStoreConfig) -> Result<Self, PostgresStoreError> {
        if config.max_connections == 0 {
            return Err(PostgresStoreError::Invalid(
                "max_connections must be greater than zero".to_string(),
            ));
        }
        let manager = PostgresConnectionManager::new(config.client_config(), NoTls);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_millis(config.connect_timeout_ms.max(1)))
            .build(manager)
            .map_err(|err| PostgresStoreError::Connection(err.to_string()))?;
        info!(host = %config.host, database = %config.database, "connected postgres metric store");
        Ok(Self {
            pool: Mutex::new(Some(pool)),
            closed: AtomicBool::new(false),
        })
    }

    /// Borrows a pooled connection.
    fn connection(&self) -> Result<PgConnection, PostgresStoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PostgresStoreError::Closed);
        }
        let pool = self
            .pool
            .lock()
            .map_err(|_| PostgresStoreError::Connection("pool mutex poisoned".to_string()))?
            .clone()
            .ok_or(PostgresStoreError::Closed)?;
        pool.get().map_err(|err| PostgresStoreError::Connection(err.to_string()))
    }

    /// Lists tables in the current schema.
    fn table_names(&self) -> Result<Vec<String>, PostgresStoreError> {
        let mut conn = self.connection()?;
        let rows = conn
            .query(
                "SELECT table_name::text FROM information_schema.tables WHERE table_schema = \
                 current_schema() AND table_type = 'BASE TABLE' ORDER BY table_name",
                &[],
            )
            .map_err(|err| pg_error(&err))?;
        rows.iter().map(|row| row.try_get::<_, String>(0).map_err(|err| pg_error(&err))).collect()
    }

    /// Lists columns of `table` by ordinal position.
    fn column_names(&self, table: &TableId) -> Result<Vec<ColumnName>, PostgresStoreError> {
        let mut conn = self.connection()?;
        let rows = conn
            .query(
                "SELECT column_name::text FROM information_schema.columns WHERE table_schema = \
                 current_schema() AND table_name = $1 ORDER BY ordinal_position",
                &[&table.as_str()],
            )
            .map_err(|err| pg_error(&err))?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, String>(0).map(ColumnName::new).map_err(|err| pg_error(&err))
            })
            .collect()
    }

    /// Runs a bounded read.
    fn read_rows(&self, filter: &QueryFilter, max_rows: u32) -> Result<Vec<Row>, PostgresStoreError> {
        let statement = ReadStatement::build(SqlDialect::Postgres, filter, max_rows);
        let values: Vec<Box<dyn ToSql + Sync>> = statement.params.iter().map(to_pg_param).collect();
        let params: Vec<&(dyn ToSql + Sync)> = values.iter().map(AsRef::as_ref).collect();
        let mut conn = self.connection()?;
        let rows = conn.query(statement.sql.as_str(), &params).map_err(|err| pg_error(&err))?;
        let mapped = rows.iter().map(map_row).collect::<Result<Vec<_>, _>>()?;
        debug!(table = %filter.table, rows = mapped.len(), "postgres read");
        Ok(mapped)
    }

    /// Inserts the device unless present.
    fn insert_device(&self, device: &DeviceId, seen_at: Timestamp) -> Result<(), PostgresStoreError> {
        let mut conn = self.connection()?;
        let inserted = conn
            .execute(
                register_device_sql(SqlDialect::Postgres).as_str(),
                &[&device.as_str(), &seen_at.to_text()],
            )
            .map_err(|err| pg_error(&err))?;
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
    ) -> Result<(), PostgresStoreError> {
        let mut conn = self.connection()?;
        let mut tx = conn.transaction().map_err(|err| pg_error(&err))?;
        let at = timestamp.to_text();
        for reading in readings {
            insert_one(&mut tx, device, reading, &at)?;
        }
        tx.commit().map_err(|err| pg_error(&err))
    }

    /// Creates registry and metric tables.
    fn create_schema(&self, tables: &[TableId]) -> Result<(), PostgresStoreError> {
        let mut conn = self.connection()?;
        let mut tx = conn.transaction().map_err(|err| pg_error(&err))?;
        for ddl in registry_table_ddl(SqlDialect::Postgres) {
            tx.batch_execute(&ddl).map_err(|err| pg_error(&err))?;
        }
        for table in tables.iter().filter(|table| !table.is_reserved()) {
            tx.batch_execute(&metric_table_ddl(SqlDialect::Postgres, table))
                .map_err(|err| pg_error(&err))?;
            tx.execute(register_metric_type_sql(SqlDialect::Postgres).as_str(), &[&table.as_str()])
                .map_err(|err| pg_error(&err))?;
        }
        tx.commit().map_err(|err| pg_error(&err))?;
        info!(tables = tables.len(), "postgres schema bootstrapped");
        Ok(())
    }

    /// Verifies a pooled connection answers.
    fn check_connection(&self) -> Result<(), PostgresStoreError> {
        let mut conn = self.connection()?;
        conn.simple_query("SELECT 1").map_err(|err| pg_error(&err))?;
        Ok(())
    }
}

impl MetricStore for PostgresMetricStore {
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
        let mut conn = self.connection()?;
        insert_one(&mut *conn, device, reading, &timestamp.to_text()).map_err(StoreError::from)
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
        match self.pool.lock() {
            Ok(mut slot) => release_pool(slot.take()),
            Err(_) => warn!("postgres pool mutex poisoned during close"),
        }
        info!("closed postgres metric store");
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Drops `pool` off the calling thread.
///
/// The sync driver owns a runtime; dropping it on an async worker panics.
fn release_pool(pool: Option<PgPool>) {
    if let Some(pool) = pool {
        let _ = std::thread::spawn(move || drop(pool));
    }
}

/// Inserts one reading; zero affected rows is schema drift.
fn insert_one(
    client: &mut impl GenericClient,
    device: &DeviceId,
    reading: &MetricValue,
    timestamp: &str,
) -> Result<(), PostgresStoreError> {
    let inserted = client
        .execute(
            insert_reading_sql(SqlDialect::Postgres, &reading.table).as_str(),
            &[&device.as_str(), &reading.value, &timestamp, &reading.table.as_str()],
        )
        .map_err(|err| pg_error(&err))?;
    if inserted == 0 {
        return Err(PostgresStoreError::SchemaDrift(format!(
            "metric type not registered: {}",
            reading.table
        )));
    }
    Ok(())
}

/// Boxes a bound parameter.
fn to_pg_param(param: &SqlParam) -> Box<dyn ToSql + Sync> {
    match param {
        SqlParam::Text(text) => Box::new(text.clone()),
        SqlParam::Integer(value) => Box::new(*value),
    }
}

/// Maps one result row by column type.
fn map_row(row: &postgres::Row) -> Result<Row, PostgresStoreError> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| map_value(row, index, column.type_()))
        .collect()
}

/// Maps one column value.
fn map_value(row: &postgres::Row, index: usize, ty: &Type) -> Result<StoredValue, PostgresStoreError> {
    let value = match *ty {
        Type::INT8 => row.try_get::<_, Option<i64>>(index).map(|v| v.map(StoredValue::Integer)),
        Type::INT4 => {
            row.try_get::<_, Option<i32>>(index).map(|v| v.map(|v| StoredValue::Integer(i64::from(v))))
        }
        Type::INT2 => {
            row.try_get::<_, Option<i16>>(index).map(|v| v.map(|v| StoredValue::Integer(i64::from(v))))
        }
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index).map(|v| v.map(StoredValue::Real)),
        Type::FLOAT4 => {
            row.try_get::<_, Option<f32>>(index).map(|v| v.map(|v| StoredValue::Real(f64::from(v))))
        }
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(index).map(|v| v.map(StoredValue::Text))
        }
        _ => {
            return Err(PostgresStoreError::Invalid(format!(
                "unsupported column type {} at position {index}",
                ty.name()
            )));
        }
    };
    value.map(|v| v.unwrap_or(StoredValue::Null)).map_err(|err| pg_error(&err))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let config = PostgresStoreConfig {
            password: "hunter2".to_string(),
            ..PostgresStoreConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn client_config_carries_connection_fields() {
        let config = PostgresStoreConfig {
            host: "db.internal".to_string(),
            port: 6543,
            user: "ingest".to_string(),
            database: "telemetry".to_string(),
            ..PostgresStoreConfig::default()
        };
        let client = config.client_config();
        assert_eq!(client.get_user(), Some("ingest"));
        assert_eq!(client.get_dbname(), Some("telemetry"));
        assert_eq!(client.get_ports(), &[6543]);
        assert_eq!(client.get_connect_timeout(), Some(&Duration::from_millis(5_000)));
    }

    #[test]
    fn store_errors_map_to_core_errors() {
        assert_eq!(
            StoreError::from(PostgresStoreError::Connection("refused".to_string())),
            StoreError::Connection("refused".to_string())
        );
        assert_eq!(StoreError::from(PostgresStoreError::Closed), StoreError::Closed);
    }

    #[test]
    fn close_takes_the_pool() {
        let manager = PostgresConnectionManager::new(PostgresStoreConfig::default().client_config(), NoTls);
        let pool = Pool::builder().max_size(1).build_unchecked(manager);
        let store = PostgresMetricStore {
            pool: Mutex::new(Some(pool)),
            closed: AtomicBool::new(false),
        };
        store.close();
        assert!(store.pool.lock().unwrap().is_none());
        assert!(matches!(store.connection(), Err(PostgresStoreError::Closed)));
        assert_eq!(store.readiness(), Err(StoreError::Closed));
        store.close();
    }
}
