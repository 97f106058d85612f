// crates/orus-cli/src/bootstrap.rs
// ============================================================================
// Module: ORUS Bootstrap
// Description: Store, allow-list, and service construction from config.
// Purpose: Perform every fail-fast startup step before the async runtime.
// Dependencies: orus-config, orus-core, orus-broker, orus-store-*
// ============================================================================

//! ## Overview
//! Startup order: resolve credentials (only when a consumer of them is
//! configured), open the store, create registry and configured metric
//! tables, then load the allow-list once. Every step is fatal on failure.
//! The Postgres client blocks on its own runtime, so stores are built here
//! before the Tokio runtime starts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use orus_broker::ConsumerSettings;
use orus_config::CredentialError;
use orus_config::CredentialProvider;
use orus_config::OrusConfig;
use orus_config::StoreBackend;
use orus_core::Clock;
use orus_core::IngestPipeline;
use orus_core::KnownTables;
use orus_core::MetricStore;
use orus_core::Normalizer;
use orus_core::QueryService;
use orus_core::SharedMetricStore;
use orus_core::StoreError;
use orus_core::TableId;
use orus_store_postgres::PostgresMetricStore;
use orus_store_sqlite::SqliteMetricStore;
use thiserror::Error;
use tracing::info;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Startup failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Credentials could not be resolved.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    /// The store could not be opened.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// A schema or introspection call failed.
    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),
}

/// Services built from one configuration.
#[derive(Clone)]
pub struct Services {
    /// Shared store handle.
    pub store: SharedMetricStore,
    /// Allow-listed metric tables.
    pub tables: KnownTables,
    /// HTTP-facing query service.
    pub query: QueryService,
    /// Broker-facing ingest pipeline.
    pub pipeline: IngestPipeline,
}

// ============================================================================
// SECTION: Bootstrap
// ============================================================================

/// Returns true when startup needs the credential provider.
#[must_use]
pub fn needs_credentials(config: &OrusConfig) -> bool {
    config.store.backend == StoreBackend::Postgres || config.broker.enabled
}

/// Builds the configured credential provider, or `None` when unused.
///
/// # Errors
///
/// Returns [`BootstrapError::Credentials`] when the provider cannot load.
pub fn credential_provider(
    config: &OrusConfig,
) -> Result<Option<Box<dyn CredentialProvider + Send + Sync>>, BootstrapError> {
    if !needs_credentials(config) {
        return Ok(None);
    }
    Ok(Some(config.credential_provider()?))
}

/// Opens the configured store.
///
/// # Errors
///
/// Returns [`BootstrapError`] when credentials are missing or the store
/// cannot be reached.
pub fn open_store(
    config: &OrusConfig,
    credentials: Option<&(dyn CredentialProvider + Send + Sync)>,
) -> Result<SharedMetricStore, BootstrapError> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let store = SqliteMetricStore::new(config.store.sqlite_store_config())
                .map_err(|err| BootstrapError::Connection(err.to_string()))?;
            info!(path = %config.store.path.display(), "opened sqlite metric store");
            Ok(SharedMetricStore::from_store(store))
        }
        StoreBackend::Postgres => {
            let provider = credentials
                .ok_or_else(|| CredentialError::Missing("credential provider".to_string()))?;
            let database = provider.database_credentials()?;
            let store = PostgresMetricStore::new(&config.store.postgres_store_config(&database))
                .map_err(|err| BootstrapError::Connection(err.to_string()))?;
            info!(
                host = %database.host,
                port = database.port,
                database = %database.database,
                "opened postgres metric store"
            );
            Ok(SharedMetricStore::from_store(store))
        }
    }
}

/// Creates registries plus configured and `extra` metric tables.
///
/// # Errors
///
/// Returns [`BootstrapError::Store`] when DDL fails.
pub fn bootstrap_tables(
    store: &SharedMetricStore,
    config: &OrusConfig,
    extra: &[TableId],
) -> Result<(), BootstrapError> {
    let mut tables = config.store.tables.clone();
    for table in extra {
        if !tables.contains(table) {
            tables.push(table.clone());
        }
    }
    store.bootstrap_schema(&tables)?;
    Ok(())
}

/// Loads the allow-list from the store.
///
/// # Errors
///
/// Returns [`BootstrapError::Store`] when introspection fails.
pub fn load_tables(store: &SharedMetricStore) -> Result<KnownTables, BootstrapError> {
    let tables = KnownTables::from_names(store.list_tables()?);
    info!(tables = %tables.names().join(","), "metric table allow-list loaded");
    Ok(tables)
}

/// Wires the query service and ingest pipeline over `store`.
#[must_use]
pub fn build_services(
    config: &OrusConfig,
    store: SharedMetricStore,
    tables: KnownTables,
    clock: Arc<dyn Clock>,
) -> Services {
    let query = QueryService::new(store.clone(), tables.clone(), Arc::clone(&clock))
        .with_max_rows(config.query.max_rows);
    let pipeline = IngestPipeline::new(
        Normalizer::new(tables.clone(), clock),
        store.clone(),
        config.ingest.write_mode,
    );
    Services { store, tables, query, pipeline }
}

/// Runs every store-side startup step.
///
/// # Errors
///
/// Returns [`BootstrapError`] on the first failing step.
pub fn prepare(
    config: &OrusConfig,
    credentials: Option<&(dyn CredentialProvider + Send + Sync)>,
    clock: Arc<dyn Clock>,
) -> Result<Services, BootstrapError> {
    let store = open_store(config, credentials)?;
    bootstrap_tables(&store, config, &[])?;
    let tables = load_tables(&store)?;
    Ok(build_services(config, store, tables, clock))
}

/// Resolves consumer settings, or `None` when the broker is disabled.
///
/// # Errors
///
/// Returns [`BootstrapError::Credentials`] when broker credentials are
/// missing.
pub fn consumer_settings(
    config: &OrusConfig,
    credentials: Option<&(dyn CredentialProvider + Send + Sync)>,
) -> Result<Option<ConsumerSettings>, BootstrapError> {
    if !config.broker.enabled {
        return Ok(None);
    }
    let provider =
        credentials.ok_or_else(|| CredentialError::Missing("credential provider".to_string()))?;
    let broker = provider.broker_credentials()?;
    Ok(Some(ConsumerSettings::from_parts(&config.broker, &broker)))
}
