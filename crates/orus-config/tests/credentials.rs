//! Credential provider tests for orus-config.
// crates/orus-config/tests/credentials.rs
// =============================================================================
// Module: Credential Provider Tests
// Description: File and environment credential sources.
// Purpose: Ensure secrets resolve, fail closed, and never print.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::HashMap;
use std::fs;

use orus_config::BROKER_PASSWORD_ENV_VAR;
use orus_config::BROKER_USER_ENV_VAR;
use orus_config::BrokerEndpoint;
use orus_config::CredentialError;
use orus_config::CredentialProvider;
use orus_config::DB_PASSWORD_ENV_VAR;
use orus_config::DB_USER_ENV_VAR;
use orus_config::DatabaseEndpoint;
use orus_config::EnvCredentialProvider;
use orus_config::FileCredentialProvider;
use orus_config::OrusConfig;
use orus_config::Secret;
use tempfile::TempDir;

fn database() -> DatabaseEndpoint {
    DatabaseEndpoint { host: "db.local".to_string(), port: 5433, database: "metrics".to_string() }
}

fn broker() -> BrokerEndpoint {
    BrokerEndpoint { host: "mqtt.local".to_string(), port: 8883, topic: "orus/#".to_string() }
}

const SECRETS: &str = r#"
[database]
user = "orus"
password = "db-secret"

[broker]
user = "api"
password = "mqtt-secret"
"#;

#[test]
fn file_provider_combines_endpoint_and_login() {
    let provider = FileCredentialProvider::from_toml(SECRETS, database(), broker()).unwrap();
    let db = provider.database_credentials().unwrap();
    assert_eq!(db.host, "db.local");
    assert_eq!(db.port, 5433);
    assert_eq!(db.user, "orus");
    assert_eq!(db.password.expose(), "db-secret");
    assert_eq!(db.database, "metrics");

    let mqtt = provider.broker_credentials().unwrap();
    assert_eq!(mqtt.user, "api");
    assert_eq!(mqtt.topic, "orus/#");
}

#[test]
fn file_provider_reports_missing_section() {
    let provider = FileCredentialProvider::from_toml(
        "[database]\nuser = \"orus\"\npassword = \"x\"\n",
        database(),
        broker(),
    )
    .unwrap();
    assert!(provider.database_credentials().is_ok());
    assert!(matches!(provider.broker_credentials(), Err(CredentialError::Missing(_))));
}

#[test]
fn file_provider_rejects_blank_user() {
    let provider = FileCredentialProvider::from_toml(
        "[database]\nuser = \"  \"\npassword = \"x\"\n",
        database(),
        broker(),
    )
    .unwrap();
    assert_eq!(
        provider.database_credentials(),
        Err(CredentialError::Missing("database.user".to_string()))
    );
}

#[test]
fn file_provider_load_errors_are_typed() {
    let dir = TempDir::new().unwrap();
    let missing = FileCredentialProvider::load(&dir.path().join("absent.toml"), database(), broker());
    assert!(matches!(missing, Err(CredentialError::Io(_))));

    let path = dir.path().join("credentials.toml");
    fs::write(&path, "[database\n").unwrap();
    let malformed = FileCredentialProvider::load(&path, database(), broker());
    assert!(matches!(malformed, Err(CredentialError::Parse(_))));
}

#[test]
fn config_builds_file_provider_from_credentials_section() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("credentials.toml");
    fs::write(&path, SECRETS).unwrap();
    let config = OrusConfig::from_toml(&format!(
        "[credentials]\nsource = \"file\"\npath = {:?}\n\n[store]\nhost = \"pg\"\n",
        path.display().to_string()
    ))
    .unwrap();
    let provider = config.credential_provider().unwrap();
    let db = provider.database_credentials().unwrap();
    assert_eq!(db.host, "pg");
    let pg = config.store.postgres_store_config(&db);
    assert_eq!(pg.user, "orus");
    assert_eq!(pg.password, "db-secret");
    assert_eq!(pg.max_connections, 16);
}

#[test]
fn env_provider_reads_named_variables() {
    let vars: HashMap<&'static str, &'static str> = HashMap::from([
        (DB_USER_ENV_VAR, "orus"),
        (DB_PASSWORD_ENV_VAR, "pw"),
        (BROKER_USER_ENV_VAR, "api"),
    ]);
    let provider = EnvCredentialProvider::with_lookup(database(), broker(), move |name| {
        vars.get(name).map(|value| (*value).to_string())
    });
    let db = provider.database_credentials().unwrap();
    assert_eq!(db.user, "orus");
    assert_eq!(db.password, Secret::new("pw"));
    assert_eq!(
        provider.broker_credentials(),
        Err(CredentialError::Missing(BROKER_PASSWORD_ENV_VAR.to_string()))
    );
}

#[test]
fn secrets_are_redacted_in_debug_output() {
    let provider = FileCredentialProvider::from_toml(SECRETS, database(), broker()).unwrap();
    let rendered = format!("{:?}", provider.database_credentials().unwrap());
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("db-secret"));
}
