//! HTTP route tests for orus-api.
// crates/orus-api/tests/routes.rs
// ============================================================================
// Module: HTTP Route Tests
// Description: Status codes and bodies for readings, tables, and health.
// Purpose: Validate the HTTP mapping of query-service outcomes.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use orus_api::ApiState;
use orus_api::DASHBOARD_READINGS_PATH;
use orus_api::router;
use orus_core::ConsumerState;
use orus_core::ConsumerStatus;
use orus_core::DeviceId;
use orus_core::FixedClock;
use orus_core::InMemoryMetricStore;
use orus_core::KnownTables;
use orus_core::MetricStore;
use orus_core::MetricValue;
use orus_core::QueryService;
use orus_core::SharedMetricStore;
use orus_core::TableId;
use orus_core::Timestamp;
use serde_json::Value;
use serde_json::json;
use tower::ServiceExt;

struct Fixture {
    store: InMemoryMetricStore,
    state: ApiState,
}

fn fixture() -> Fixture {
    let store = InMemoryMetricStore::with_tables(["TEMPERATURE", "HUMIDITY"]).unwrap();
    let at = Timestamp::parse("2024-01-15 10:00:00").unwrap();
    store.register_device_if_absent(&DeviceId::new("dev1"), at).unwrap();
    store
        .write_reading(
            &DeviceId::new("dev1"),
            &MetricValue { table: TableId::parse("TEMPERATURE").unwrap(), value: 23.457 },
            at,
        )
        .unwrap();
    let shared = SharedMetricStore::from_store(store.clone());
    let tables = KnownTables::from_names(shared.list_tables().unwrap());
    let clock = Arc::new(FixedClock(Timestamp::parse("2024-02-01 00:00:00").unwrap()));
    let service = QueryService::new(shared.clone(), tables, clock);
    let state = ApiState::new(service, shared, ConsumerStatus::new(ConsumerState::Receiving));
    Fixture { store, state }
}

async fn get(state: ApiState, uri: &str) -> (StatusCode, Value) {
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn readings_return_ordered_records() {
    let fixture = fixture();
    let (status, body) = get(
        fixture.state,
        "/readings?table_id=TEMPERATURE&start_date=2024-01-01%2000:00:00&end_date=2024-01-31%2023:59:59",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    let keys: Vec<&String> = records[0].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["ID", "CHIP_ID", "TYPE_ID", "VALUE", "TIMESTAMP"]);
    assert_eq!(records[0]["VALUE"], json!(23.457));
    assert_eq!(records[0]["TIMESTAMP"], json!("2024-01-15 10:00:00"));
}

#[tokio::test]
async fn missing_table_id_is_bad_request() {
    let (status, body) = get(fixture().state, "/readings").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!("An error occurred while processing the request. Error: table_id is required")
    );
}

#[tokio::test]
async fn unknown_table_never_reaches_store() {
    let fixture = fixture();
    let (status, body) = get(fixture.state, "/readings?table_id=WIND").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().unwrap().contains("WIND"));
    assert_eq!(fixture.store.query_calls(), 0);
}

#[tokio::test]
async fn injection_attempt_is_rejected() {
    let fixture = fixture();
    let (status, body) =
        get(fixture.state, "/readings?table_id=TEMPERATURE%3B%20DROP%20TABLE%20DEVICES").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().unwrap().contains("table_id"));
    assert_eq!(fixture.store.query_calls(), 0);
}

#[tokio::test]
async fn bad_date_is_bad_request() {
    let (status, body) =
        get(fixture().state, "/readings?table_id=TEMPERATURE&start_date=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().unwrap().contains("start_date"));
}

#[tokio::test]
async fn inverted_range_is_empty_not_error() {
    let (status, body) = get(
        fixture().state,
        "/readings?table_id=TEMPERATURE&start_date=2024-01-31%2000:00:00&end_date=2024-01-01%2000:00:00",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn store_failure_is_internal_error_with_cause() {
    let fixture = fixture();
    fixture.store.close();
    let (status, body) = get(fixture.state, "/readings?table_id=TEMPERATURE").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!(
            "An error occurred while processing the request. Error: store failure: metric store is closed"
        )
    );
}

#[tokio::test]
async fn dashboard_path_serves_readings() {
    let (status, body) =
        get(fixture().state, &format!("{DASHBOARD_READINGS_PATH}?table_id=TEMPERATURE")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["VALUE"], json!(23.457));

    let (status, body) = get(fixture().state, DASHBOARD_READINGS_PATH).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().unwrap().ends_with("table_id is required"));
}

#[tokio::test]
async fn tables_lists_allow_list() {
    let (status, body) = get(fixture().state, "/tables").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["HUMIDITY", "TEMPERATURE"]));
}

#[tokio::test]
async fn health_reports_store_and_consumer() {
    let fixture = fixture();
    let (status, body) = get(fixture.state.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "store": "ready", "consumer": "receiving" }));

    fixture.store.close();
    let (status, body) = get(fixture.state, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], json!("unavailable"));
}
