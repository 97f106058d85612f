//! Startup wiring tests.
// crates/orus-cli/tests/bootstrap.rs
// ============================================================================
// Module: Bootstrap Tests
// Description: Store opening, schema bootstrap, and service wiring.
// Purpose: Validate startup against a temporary SQLite database.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::sync::Arc;

use orus_cli::bootstrap;
use orus_cli::bootstrap::BootstrapError;
use orus_config::CredentialError;
use orus_config::OrusConfig;
use orus_core::FixedClock;
use orus_core::MetricStore;
use orus_core::RawFilter;
use orus_core::TableId;
use orus_core::Timestamp;
use tempfile::TempDir;

fn sqlite_config(db: &Path) -> OrusConfig {
    OrusConfig::from_toml(&format!(
        r#"
[store]
path = '{}'
tables = ["TEMPERATURE", "HUMIDITY"]

[broker]
enabled = false
"#,
        db.display()
    ))
    .unwrap()
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Timestamp::parse("2024-03-01 12:00:00").unwrap()))
}

#[test]
fn sqlite_only_config_needs_no_credentials() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(&dir.path().join("orus.db"));
    assert!(!bootstrap::needs_credentials(&config));
    assert!(bootstrap::credential_provider(&config).unwrap().is_none());
    assert!(bootstrap::consumer_settings(&config, None).unwrap().is_none());
}

#[test]
fn prepare_creates_tables_and_loads_allow_list() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(&dir.path().join("orus.db"));
    let services = bootstrap::prepare(&config, None, clock()).unwrap();
    assert_eq!(services.tables.names(), vec!["HUMIDITY".to_string(), "TEMPERATURE".to_string()]);
    assert_eq!(services.query.tables().names(), services.tables.names());
    services.store.close();
}

#[test]
fn ingested_readings_are_queryable_through_services() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(&dir.path().join("orus.db"));
    let services = bootstrap::prepare(&config, None, clock()).unwrap();

    let report =
        services.pipeline.process(br#"{"CLIENT_ID":"dev1","TEMPERATURE":21.4567,"HUMIDITY":40}"#).unwrap();
    assert_eq!(report.written, 2);

    let result = services.query.handle(&RawFilter::table("TEMPERATURE")).unwrap();
    assert_eq!(result.len(), 1);
    let body = serde_json::to_value(&result).unwrap();
    assert_eq!(body[0]["CHIP_ID"], "dev1");
    assert_eq!(body[0]["VALUE"], 21.457);
    assert_eq!(body[0]["TIMESTAMP"], "2024-03-01 12:00:00");
    services.store.close();
}

#[test]
fn extra_tables_join_the_allow_list_on_reopen() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(&dir.path().join("orus.db"));
    let store = bootstrap::open_store(&config, None).unwrap();
    bootstrap::bootstrap_tables(&store, &config, &[TableId::parse("PRESSURE").unwrap()]).unwrap();
    store.close();

    let reopened = bootstrap::open_store(&config, None).unwrap();
    let tables = bootstrap::load_tables(&reopened).unwrap();
    assert!(tables.contains("PRESSURE"));
    assert!(!tables.contains("DEVICES"));
    reopened.close();
}

#[test]
fn postgres_backend_without_provider_is_a_credential_error() {
    let config = OrusConfig::from_toml(
        r#"
[store]
backend = "postgres"

[broker]
enabled = false
"#,
    )
    .unwrap();
    assert!(bootstrap::needs_credentials(&config));
    match bootstrap::open_store(&config, None) {
        Err(BootstrapError::Credentials(CredentialError::Missing(what))) => {
            assert_eq!(what, "credential provider");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected credential error"),
    }
}

#[test]
fn enabled_broker_reads_credentials_file() {
    let dir = TempDir::new().unwrap();
    let creds = dir.path().join("credentials.toml");
    std::fs::write(
        &creds,
        "[database]\nuser = \"db\"\npassword = \"dbpw\"\n\n[broker]\nuser = \"mqtt\"\npassword = \"mqttpw\"\n",
    )
    .unwrap();
    let config = OrusConfig::from_toml(&format!(
        r#"
[store]
path = '{}'

[broker]
host = "broker.local"
topic = "plant/telemetry"

[credentials]
path = '{}'
"#,
        dir.path().join("orus.db").display(),
        creds.display()
    ))
    .unwrap();
    let provider = bootstrap::credential_provider(&config).unwrap().unwrap();
    let settings = bootstrap::consumer_settings(&config, Some(provider.as_ref())).unwrap().unwrap();
    assert_eq!(settings.host, "broker.local");
    assert_eq!(settings.topic, "plant/telemetry");
    assert_eq!(settings.user, "mqtt");
    assert_eq!(settings.password.expose(), "mqttpw");
    assert_eq!(settings.client_id, "ORUS_API");
}
