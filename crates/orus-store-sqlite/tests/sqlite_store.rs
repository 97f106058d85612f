//! `SQLite` metric store integration tests.
// crates/orus-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Metric Store Tests
// Description: Schema bootstrap, device registration, writes, and bounded reads.
// Purpose: Validate the SQLite backend against the MetricStore contract.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::thread;

use orus_core::DeviceId;
use orus_core::FixedClock;
use orus_core::IngestPipeline;
use orus_core::KnownTables;
use orus_core::MetricStore;
use orus_core::MetricValue;
use orus_core::Normalizer;
use orus_core::QueryFilter;
use orus_core::QueryService;
use orus_core::RawFilter;
use orus_core::SharedMetricStore;
use orus_core::StoreError;
use orus_core::StoredValue;
use orus_core::TableId;
use orus_core::TimeRange;
use orus_core::Timestamp;
use orus_core::WriteMode;
use orus_store_sqlite::SqliteMetricStore;
use orus_store_sqlite::SqliteStoreConfig;
use orus_store_sqlite::SqliteStoreError;
use rusqlite::Connection;
use tempfile::TempDir;

fn ts(raw: &str) -> Timestamp {
    Timestamp::parse(raw).unwrap()
}

fn table(name: &str) -> TableId {
    TableId::parse(name).unwrap()
}

fn open_store(dir: &TempDir) -> SqliteMetricStore {
    let store = SqliteMetricStore::new(SqliteStoreConfig::new(dir.path().join("orus.db"))).unwrap();
    store.bootstrap_schema(&[table("TEMPERATURE"), table("HUMIDITY")]).unwrap();
    store
}

#[test]
fn bootstrap_is_idempotent_and_lists_tables() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.bootstrap_schema(&[table("TEMPERATURE")]).unwrap();
    let names = store.list_tables().unwrap();
    assert_eq!(names, vec!["DEVICES", "HUMIDITY", "METRIC_TYPES", "TEMPERATURE"]);
    let allow_list = KnownTables::from_names(&names);
    assert_eq!(allow_list.names(), vec!["HUMIDITY", "TEMPERATURE"]);
}

#[test]
fn columns_follow_declaration_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let columns: Vec<String> = store
        .list_columns(&table("TEMPERATURE"))
        .unwrap()
        .into_iter()
        .map(|column| column.as_str().to_string())
        .collect();
    assert_eq!(columns, vec!["ID", "CHIP_ID", "TYPE_ID", "VALUE", "TIMESTAMP"]);
}

#[test]
fn duplicate_device_registration_keeps_one_row() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let device = DeviceId::new("dev1");
    store.register_device_if_absent(&device, ts("2024-01-01 00:00:00")).unwrap();
    store.register_device_if_absent(&device, ts("2024-01-02 00:00:00")).unwrap();

    let conn = Connection::open(dir.path().join("orus.db")).unwrap();
    let (count, registered): (i64, String) = conn
        .query_row("SELECT COUNT(*), MIN(\"REGISTERED_AT\") FROM \"DEVICES\"", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(registered, "2024-01-01 00:00:00");
}

#[test]
fn write_then_query_returns_bounded_ordered_rows() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let device = DeviceId::new("dev1");
    for (value, at) in
        [(3.0, "2024-01-03 00:00:00"), (1.0, "2024-01-01 00:00:00"), (2.0, "2024-01-02 00:00:00")]
    {
        store
            .write_reading(&device, &MetricValue { table: table("TEMPERATURE"), value }, ts(at))
            .unwrap();
    }

    let between = QueryFilter {
        table: table("TEMPERATURE"),
        range: TimeRange::Between(ts("2024-01-01 00:00:00"), ts("2024-01-02 00:00:00")),
    };
    let rows = store.query(&between, 100).unwrap();
    let values: Vec<&StoredValue> = rows.iter().map(|row| &row[3]).collect();
    assert_eq!(values, vec![&StoredValue::Real(1.0), &StoredValue::Real(2.0)]);

    let limited = QueryFilter { table: table("TEMPERATURE"), range: TimeRange::Unbounded };
    assert_eq!(store.query(&limited, 2).unwrap().len(), 2);

    let inverted = QueryFilter {
        table: table("TEMPERATURE"),
        range: TimeRange::Between(ts("2024-01-03 00:00:00"), ts("2024-01-01 00:00:00")),
    };
    assert!(store.query(&inverted, 100).unwrap().is_empty());
}

#[test]
fn missing_metric_type_is_schema_drift() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let conn = Connection::open(dir.path().join("orus.db")).unwrap();
    conn.execute_batch(&orus_core::metric_table_ddl(orus_core::SqlDialect::Sqlite, &table("CO2")))
        .unwrap();
    let result = store.write_reading(
        &DeviceId::new("dev1"),
        &MetricValue { table: table("CO2"), value: 400.0 },
        ts("2024-01-01 00:00:00"),
    );
    assert!(matches!(result, Err(StoreError::SchemaDrift(_))));
}

#[test]
fn batch_write_rolls_back_on_failure() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let result = store.write_readings(
        &DeviceId::new("dev1"),
        &[
            MetricValue { table: table("TEMPERATURE"), value: 1.0 },
            MetricValue { table: table("PRESSURE"), value: 2.0 },
        ],
        ts("2024-01-01 00:00:00"),
    );
    assert!(matches!(result, Err(StoreError::Db(_))));
    let filter = QueryFilter { table: table("TEMPERATURE"), range: TimeRange::Unbounded };
    assert!(store.query(&filter, 10).unwrap().is_empty());
}

#[test]
fn pipeline_and_query_service_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = SharedMetricStore::from_store(open_store(&dir));
    let tables = KnownTables::from_names(store.list_tables().unwrap());
    let clock = Arc::new(FixedClock(ts("2024-02-01 08:00:00")));
    let pipeline = IngestPipeline::new(
        Normalizer::new(tables.clone(), clock.clone()),
        store.clone(),
        WriteMode::Atomic,
    );
    pipeline.process(br#"{"CLIENT_ID":"dev1","TEMPERATURE":23.4567,"HUMIDITY":55.5}"#).unwrap();

    let service = QueryService::new(store, tables, clock);
    let result = service
        .handle(
            &RawFilter::table("TEMPERATURE")
                .with_start("2024-02-01 00:00:00")
                .with_end("2024-02-01 23:59:59"),
        )
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.0[0].get("VALUE"), Some(&StoredValue::Real(23.457)));
    assert_eq!(result.0[0].get("TIMESTAMP"), Some(&StoredValue::Text("2024-02-01 08:00:00".into())));
}

#[test]
fn concurrent_reads_and_writes_succeed() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for index in 0 .. 50 {
                let value = f64::from(index);
                store
                    .write_reading(
                        &DeviceId::new("dev1"),
                        &MetricValue { table: table("HUMIDITY"), value },
                        ts("2024-01-01 00:00:00"),
                    )
                    .unwrap();
            }
        })
    };
    let filter = QueryFilter { table: table("HUMIDITY"), range: TimeRange::Unbounded };
    for _ in 0 .. 20 {
        store.query(&filter, 1_000).unwrap();
    }
    writer.join().unwrap();
    assert_eq!(store.query(&filter, 1_000).unwrap().len(), 50);
}

#[test]
fn closed_store_rejects_operations() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    assert_eq!(store.readiness(), Ok(()));
    store.close();
    store.close();
    assert_eq!(store.readiness(), Err(StoreError::Closed));
}

#[test]
fn close_releases_connections_while_handles_remain() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let held = store.clone();
    let wal = dir.path().join("orus.db-wal");
    store.register_device_if_absent(&DeviceId::new("dev1"), ts("2024-01-01 00:00:00")).unwrap();
    assert!(wal.exists());

    store.close();
    assert!(!wal.exists(), "last connection close checkpoints and removes the WAL");
    assert_eq!(held.list_tables(), Err(StoreError::Closed));
    assert!(matches!(
        held.register_device_if_absent(&DeviceId::new("dev2"), ts("2024-01-01 00:00:00")),
        Err(StoreError::Closed)
    ));
}

#[test]
fn directory_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let result = SqliteMetricStore::new(SqliteStoreConfig::new(dir.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn zero_read_pool_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = SqliteStoreConfig::new(dir.path().join("orus.db"));
    config.read_pool_size = 0;
    assert!(matches!(SqliteMetricStore::new(config), Err(SqliteStoreError::Invalid(_))));
}
