// crates/orus-store-postgres/tests/postgres_store.rs
// ============================================================================
// Module: Postgres Store Tests
// Description: Configuration and fail-fast connection checks.
// Purpose: Validate error handling without a live database.
// ============================================================================

//! Postgres store unit tests.

use orus_core::StoreError;
use orus_store_postgres::PostgresMetricStore;
use orus_store_postgres::PostgresStoreConfig;
use orus_store_postgres::PostgresStoreError;

#[test]
fn postgres_store_default_config_is_valid_shape() {
    let config = PostgresStoreConfig::default();
    assert!(!config.host.is_empty());
    assert_eq!(config.port, 5432);
    assert!(config.max_connections > 0);
    assert!(config.connect_timeout_ms > 0);
}

#[test]
fn postgres_store_unreachable_server_fails_fast() {
    let config = PostgresStoreConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        max_connections: 1,
        connect_timeout_ms: 200,
        ..PostgresStoreConfig::default()
    };
    let result = PostgresMetricStore::new(&config);
    assert!(matches!(result, Err(PostgresStoreError::Connection(_))));
    let mapped = StoreError::from(PostgresStoreError::Connection("refused".to_string()));
    assert!(matches!(mapped, StoreError::Connection(_)));
}

#[test]
fn postgres_store_rejects_empty_pool() {
    let config = PostgresStoreConfig {
        max_connections: 0,
        ..PostgresStoreConfig::default()
    };
    assert!(matches!(PostgresMetricStore::new(&config), Err(PostgresStoreError::Invalid(_))));
}
