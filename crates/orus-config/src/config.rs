// crates/orus-config/src/config.rs
// ============================================================================
// Module: ORUS Configuration
// Description: Configuration loading and validation for the ORUS service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: orus-core, orus-store-sqlite, orus-store-postgres, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and falls back to documented defaults; values
//! that are present are validated before anything connects to a store or a
//! broker. Secrets never live here; see [`crate::credentials`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use orus_core::DEFAULT_MAX_ROWS;
use orus_core::TableId;
use orus_core::WriteMode;
use orus_store_postgres::PostgresStoreConfig;
use orus_store_sqlite::SqliteJournalMode;
use orus_store_sqlite::SqliteStoreConfig;
use orus_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

use crate::credentials::BrokerEndpoint;
use crate::credentials::CredentialError;
use crate::credentials::CredentialProvider;
use crate::credentials::DatabaseCredentials;
use crate::credentials::DatabaseEndpoint;
use crate::credentials::EnvCredentialProvider;
use crate::credentials::FileCredentialProvider;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "orus.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "ORUS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default HTTP bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default `SQLite` database path.
const DEFAULT_SQLITE_PATH: &str = "data/orus.db";
/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default number of `SQLite` read connections.
const DEFAULT_READ_POOL_SIZE: usize = 4;
/// Maximum number of `SQLite` read connections.
const MAX_READ_POOL_SIZE: usize = 64;
/// Default Postgres port.
const DEFAULT_POSTGRES_PORT: u16 = 5432;
/// Maximum Postgres pool size.
const MAX_POSTGRES_CONNECTIONS: u32 = 256;
/// Default MQTT broker port (TLS).
const DEFAULT_BROKER_PORT: u16 = 8883;
/// Default MQTT client identifier.
const DEFAULT_CLIENT_ID: &str = "ORUS_API";
/// Maximum MQTT client identifier length.
const MAX_CLIENT_ID_LENGTH: usize = 256;
/// Maximum MQTT topic length in bytes.
const MAX_TOPIC_LENGTH: usize = 65_535;
/// Minimum MQTT keep-alive in seconds.
const MIN_KEEP_ALIVE_SECS: u64 = 5;
/// Maximum MQTT keep-alive in seconds.
const MAX_KEEP_ALIVE_SECS: u64 = 3_600;
/// Default ingest queue capacity.
const DEFAULT_QUEUE_CAPACITY: usize = 1_024;
/// Maximum ingest queue capacity.
const MAX_QUEUE_CAPACITY: usize = 1_000_000;
/// Minimum connect timeout in milliseconds.
const MIN_CONNECT_TIMEOUT_MS: u64 = 100;
/// Maximum connect timeout in milliseconds.
const MAX_CONNECT_TIMEOUT_MS: u64 = 60_000;
/// Default connect timeout in milliseconds.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Maximum rows a single query may return.
const MAX_QUERY_ROWS: u32 = 1_000_000;
/// Default credentials file path.
const DEFAULT_CREDENTIALS_PATH: &str = "data/credentials.toml";

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// ORUS service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrusConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// MQTT broker configuration.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Query service limits.
    #[serde(default)]
    pub query: QueryConfig,
    /// Ingestion behavior.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Credential source selection.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OrusConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `ORUS_CONFIG`, then
    /// `orus.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::from_toml(content)?;
        tracing::debug!(path = %resolved.display(), "configuration loaded");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.broker.validate()?;
        self.query.validate()?;
        self.credentials.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Builds the credential provider selected by `[credentials]`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the secrets file cannot be loaded.
    pub fn credential_provider(
        &self,
    ) -> Result<Box<dyn CredentialProvider + Send + Sync>, CredentialError> {
        let database = self.store.database_endpoint();
        let broker = self.broker.endpoint();
        match self.credentials.source {
            CredentialSource::File => Ok(Box::new(FileCredentialProvider::load(
                &self.credentials.path,
                database,
                broker,
            )?)),
            CredentialSource::Env => Ok(Box::new(EnvCredentialProvider::new(database, broker))),
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the query API.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid server.bind: {}", self.bind)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr().map(|_| ())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Persistence backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Local `SQLite` database file.
    #[default]
    Sqlite,
    /// Remote Postgres server.
    Postgres,
}

/// Persistence backend configuration.
///
/// `SQLite` uses `path` and the tuning knobs; Postgres uses the network
/// settings, with login credentials supplied by the credential provider.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend type.
    #[serde(default)]
    pub backend: StoreBackend,
    /// `SQLite` database path.
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Number of `SQLite` read connections.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
    /// Postgres host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Postgres port.
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    /// Postgres database name.
    #[serde(default = "default_database")]
    pub database: String,
    /// Postgres pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Postgres connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Metric tables created at startup if missing.
    #[serde(default)]
    pub tables: Vec<TableId>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_sqlite_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
            read_pool_size: default_read_pool_size(),
            host: default_host(),
            port: default_postgres_port(),
            database: default_database(),
            max_connections: default_max_connections(),
            connect_timeout_ms: default_connect_timeout_ms(),
            tables: Vec::new(),
        }
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(table) = self.tables.iter().find(|table| table.is_reserved()) {
            return Err(ConfigError::Invalid(format!(
                "store.tables must not name a registry table: {table}"
            )));
        }
        match self.backend {
            StoreBackend::Sqlite => {
                validate_path_string("store.path", &self.path.to_string_lossy())?;
                if self.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                if self.read_pool_size == 0 || self.read_pool_size > MAX_READ_POOL_SIZE {
                    return Err(ConfigError::Invalid(format!(
                        "store.read_pool_size must be between 1 and {MAX_READ_POOL_SIZE}"
                    )));
                }
            }
            StoreBackend::Postgres => {
                validate_non_empty("store.host", &self.host)?;
                validate_non_empty("store.database", &self.database)?;
                if self.port == 0 {
                    return Err(ConfigError::Invalid(
                        "store.port must be greater than zero".to_string(),
                    ));
                }
                if self.max_connections == 0 || self.max_connections > MAX_POSTGRES_CONNECTIONS {
                    return Err(ConfigError::Invalid(format!(
                        "store.max_connections must be between 1 and {MAX_POSTGRES_CONNECTIONS}"
                    )));
                }
                validate_timeout("store.connect_timeout_ms", self.connect_timeout_ms)?;
            }
        }
        Ok(())
    }

    /// Returns the `SQLite` store settings.
    #[must_use]
    pub fn sqlite_store_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
            read_pool_size: self.read_pool_size,
        }
    }

    /// Returns the Postgres store settings for the resolved credentials.
    #[must_use]
    pub fn postgres_store_config(&self, credentials: &DatabaseCredentials) -> PostgresStoreConfig {
        PostgresStoreConfig {
            host: credentials.host.clone(),
            port: credentials.port,
            user: credentials.user.clone(),
            password: credentials.password.expose().to_string(),
            database: credentials.database.clone(),
            max_connections: self.max_connections,
            connect_timeout_ms: self.connect_timeout_ms,
        }
    }

    /// Returns the non-secret database endpoint.
    #[must_use]
    pub fn database_endpoint(&self) -> DatabaseEndpoint {
        DatabaseEndpoint {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
        }
    }
}

// ============================================================================
// SECTION: Broker
// ============================================================================

/// MQTT broker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Whether the ingestion consumer runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Broker host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Broker port.
    #[serde(default = "default_broker_port")]
    pub port: u16,
    /// Telemetry topic filter.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// MQTT client identifier.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Use TLS for the broker connection.
    #[serde(default = "default_true")]
    pub tls: bool,
    /// Keep-alive interval in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Bounded ingest queue capacity.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Startup handshake timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_broker_port(),
            topic: default_topic(),
            client_id: default_client_id(),
            tls: true,
            keep_alive_secs: default_keep_alive_secs(),
            queue_capacity: default_queue_capacity(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl BrokerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        validate_non_empty("broker.host", &self.host)?;
        if self.port == 0 {
            return Err(ConfigError::Invalid("broker.port must be greater than zero".to_string()));
        }
        validate_non_empty("broker.topic", &self.topic)?;
        if self.topic.len() > MAX_TOPIC_LENGTH {
            return Err(ConfigError::Invalid("broker.topic exceeds max length".to_string()));
        }
        validate_non_empty("broker.client_id", &self.client_id)?;
        if self.client_id.len() > MAX_CLIENT_ID_LENGTH {
            return Err(ConfigError::Invalid("broker.client_id exceeds max length".to_string()));
        }
        if !(MIN_KEEP_ALIVE_SECS ..= MAX_KEEP_ALIVE_SECS).contains(&self.keep_alive_secs) {
            return Err(ConfigError::Invalid(format!(
                "broker.keep_alive_secs must be between {MIN_KEEP_ALIVE_SECS} and \
                 {MAX_KEEP_ALIVE_SECS}"
            )));
        }
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "broker.queue_capacity must be between 1 and {MAX_QUEUE_CAPACITY}"
            )));
        }
        validate_timeout("broker.connect_timeout_ms", self.connect_timeout_ms)
    }

    /// Returns the non-secret broker endpoint.
    #[must_use]
    pub fn endpoint(&self) -> BrokerEndpoint {
        BrokerEndpoint { host: self.host.clone(), port: self.port, topic: self.topic.clone() }
    }
}

// ============================================================================
// SECTION: Query and Ingest
// ============================================================================

/// Query service limits.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Maximum rows returned per request.
    #[serde(default = "default_max_rows")]
    pub max_rows: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { max_rows: default_max_rows() }
    }
}

impl QueryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rows == 0 || self.max_rows > MAX_QUERY_ROWS {
            return Err(ConfigError::Invalid(format!(
                "query.max_rows must be between 1 and {MAX_QUERY_ROWS}"
            )));
        }
        Ok(())
    }
}

/// Ingestion behavior.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct IngestConfig {
    /// How a message's readings are committed.
    #[serde(default)]
    pub write_mode: WriteMode,
}

// ============================================================================
// SECTION: Credentials and Logging
// ============================================================================

/// Where secrets are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// TOML secrets file.
    #[default]
    File,
    /// Process environment.
    Env,
}

/// Credential source selection.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Source type.
    #[serde(default)]
    pub source: CredentialSource,
    /// Secrets file path for the `file` source.
    #[serde(default = "default_credentials_path")]
    pub path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self { source: CredentialSource::default(), path: default_credentials_path() }
    }
}

impl CredentialsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.source {
            CredentialSource::File => {
                validate_path_string("credentials.path", &self.path.to_string_lossy())
            }
            CredentialSource::Env => Ok(()),
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Trace and above.
    Trace,
    /// Debug and above.
    Debug,
    /// Info and above.
    #[default]
    Info,
    /// Warnings and errors.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Default level; `RUST_LOG` overrides it.
    #[serde(default)]
    pub level: LogLevel,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Optional log file (appended); stderr when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(file) = &self.file {
            validate_path_string("logging.file", &file.to_string_lossy())?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI input, environment, or the default.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

fn validate_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_CONNECT_TIMEOUT_MS ..= MAX_CONNECT_TIMEOUT_MS).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_CONNECT_TIMEOUT_MS} and {MAX_CONNECT_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from(DEFAULT_SQLITE_PATH)
}

const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

const fn default_read_pool_size() -> usize {
    DEFAULT_READ_POOL_SIZE
}

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_postgres_port() -> u16 {
    DEFAULT_POSTGRES_PORT
}

fn default_database() -> String {
    "orus".to_string()
}

const fn default_max_connections() -> u32 {
    16
}

const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

const fn default_true() -> bool {
    true
}

const fn default_broker_port() -> u16 {
    DEFAULT_BROKER_PORT
}

fn default_topic() -> String {
    "orus/telemetry".to_string()
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

const fn default_keep_alive_secs() -> u64 {
    30
}

const fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

const fn default_max_rows() -> u32 {
    DEFAULT_MAX_ROWS
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from(DEFAULT_CREDENTIALS_PATH)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn validate_path_string_rejects_empty_string() {
        let result = validate_path_string("test_path", "  ");
        assert!(result.unwrap_err().to_string().contains("non-empty"));
    }

    #[test]
    fn validate_path_string_rejects_long_component() {
        let long = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let result = validate_path_string("test_path", &format!("data/{long}"));
        assert!(result.unwrap_err().to_string().contains("component too long"));
    }

    #[test]
    fn explicit_path_wins_resolution() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }

    #[test]
    fn timeout_bounds_are_inclusive() {
        assert!(validate_timeout("t", MIN_CONNECT_TIMEOUT_MS).is_ok());
        assert!(validate_timeout("t", MAX_CONNECT_TIMEOUT_MS).is_ok());
        assert!(validate_timeout("t", MIN_CONNECT_TIMEOUT_MS - 1).is_err());
    }
}
