//! Ingest worker tests.
// crates/orus-broker/tests/ingest_worker.rs
// ============================================================================
// Module: Ingest Worker Tests
// Description: Queue draining against the in-memory metric store.
// Purpose: Validate ordering, discard, and failure isolation per message.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use bytes::Bytes;
use orus_broker::InboundMessage;
use orus_broker::IngestQueue;
use orus_broker::IngestWorker;
use orus_broker::WorkerStats;
use orus_core::FixedClock;
use orus_core::InMemoryMetricStore;
use orus_core::IngestPipeline;
use orus_core::KnownTables;
use orus_core::MetricStore;
use orus_core::Normalizer;
use orus_core::QueryFilter;
use orus_core::SharedMetricStore;
use orus_core::StoreError;
use orus_core::StoredValue;
use orus_core::TableId;
use orus_core::TimeRange;
use orus_core::Timestamp;
use orus_core::WriteMode;

fn pipeline(store: &InMemoryMetricStore) -> IngestPipeline {
    let tables = KnownTables::from_names(store.list_tables().unwrap());
    let clock = Arc::new(FixedClock(Timestamp::parse("2024-03-01 12:00:00").unwrap()));
    IngestPipeline::new(
        Normalizer::new(tables, clock),
        SharedMetricStore::from_store(store.clone()),
        WriteMode::Atomic,
    )
}

fn message(body: &'static str) -> InboundMessage {
    InboundMessage { topic: "orus/telemetry".to_string(), payload: Bytes::from_static(body.as_bytes()) }
}

#[test]
fn worker_processes_in_order_and_survives_bad_messages() {
    let store = InMemoryMetricStore::with_tables(["TEMPERATURE"]).unwrap();
    let (queue, receiver) = IngestQueue::bounded(16);
    let worker = IngestWorker::spawn(receiver, pipeline(&store)).unwrap();

    queue.offer(message(r#"{"CLIENT_ID":"dev1","TEMPERATURE":1.0}"#)).unwrap();
    queue.offer(message("not json")).unwrap();
    queue.offer(message(r#"{"CLIENT_ID":"dev1","WIND":3}"#)).unwrap();
    queue.offer(message(r#"{"CLIENT_ID":"dev2","TEMPERATURE":2.0}"#)).unwrap();
    drop(queue);

    let stats = worker.join().unwrap();
    assert_eq!(stats, WorkerStats { persisted: 2, rejected: 2, failed: 0 });
    assert_eq!(store.device_count().unwrap(), 2);

    let filter = QueryFilter { table: TableId::parse("TEMPERATURE").unwrap(), range: TimeRange::Unbounded };
    let rows = store.query(&filter, 10).unwrap();
    let values: Vec<&StoredValue> = rows.iter().map(|row| &row[3]).collect();
    assert_eq!(values, vec![&StoredValue::Real(1.0), &StoredValue::Real(2.0)]);
}

#[test]
fn store_failure_does_not_stop_the_worker() {
    let store = InMemoryMetricStore::with_tables(["TEMPERATURE", "HUMIDITY"]).unwrap();
    store
        .inject_write_failure(TableId::parse("HUMIDITY").unwrap(), StoreError::Db("disk full".to_string()))
        .unwrap();
    let (queue, receiver) = IngestQueue::bounded(4);
    let worker = IngestWorker::spawn(receiver, pipeline(&store)).unwrap();

    queue.offer(message(r#"{"CLIENT_ID":"dev1","HUMIDITY":40}"#)).unwrap();
    queue.offer(message(r#"{"CLIENT_ID":"dev1","TEMPERATURE":20}"#)).unwrap();
    drop(queue);

    let stats = worker.join().unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.persisted, 1);
    assert_eq!(store.row_count("TEMPERATURE").unwrap(), 1);
    assert_eq!(store.row_count("HUMIDITY").unwrap(), 0);
}
