// crates/orus-cli/src/main.rs
// ============================================================================
// Module: ORUS CLI Entry Point
// Description: Command dispatcher for the ORUS telemetry service.
// Purpose: Run the service and offer offline config, store, and query tools.
// Dependencies: clap, orus-api, orus-broker, orus-config, orus-core, tokio
// ============================================================================

//! ## Overview
//! `orus serve` performs all blocking startup work (config, credentials,
//! store, allow-list) on the main thread, then starts a Tokio runtime that
//! runs the HTTP API next to the MQTT consumer. A consumer transport failure
//! ends the process with a failure exit code so a supervisor can restart it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use orus_api::ApiServer;
use orus_api::ApiState;
use orus_broker::ConsumerSettings;
use orus_broker::IngestQueue;
use orus_broker::IngestWorker;
use orus_broker::MqttConsumer;
use orus_cli::bootstrap;
use orus_cli::bootstrap::Services;
use orus_cli::logging;
use orus_config::OrusConfig;
use orus_config::StoreBackend;
use orus_config::config_toml_example;
use orus_core::ConsumerState;
use orus_core::ConsumerStatus;
use orus_core::MetricStore;
use orus_core::RawFilter;
use orus_core::SharedMetricStore;
use orus_core::SystemClock;
use orus_core::TableId;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "orus", version, about = "ORUS telemetry ingestion and query service")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API and the MQTT ingestion consumer.
    Serve(ConfigArg),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Store maintenance utilities.
    Store {
        /// Selected store subcommand.
        #[command(subcommand)]
        command: StoreCommand,
    },
    /// Run one readings query and print the JSON result.
    Query(QueryCommand),
}

/// Shared `--config` argument.
#[derive(Args, Debug)]
struct ConfigArg {
    /// Config file path (defaults to `ORUS_CONFIG`, then orus.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigArg),
    /// Print a canonical example configuration.
    Example,
}

/// Store subcommands.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Create registry tables plus configured and named metric tables.
    Init(StoreInitCommand),
    /// Print the metric table allow-list.
    Tables(ConfigArg),
}

/// Arguments for `store init`.
#[derive(Args, Debug)]
struct StoreInitCommand {
    /// Config file location.
    #[command(flatten)]
    config: ConfigArg,
    /// Additional metric table to create (repeatable).
    #[arg(long = "table", value_name = "NAME")]
    tables: Vec<String>,
}

/// Arguments for `query`.
#[derive(Args, Debug)]
struct QueryCommand {
    /// Config file location.
    #[command(flatten)]
    config: ConfigArg,
    /// Metric table to read.
    #[arg(long)]
    table_id: String,
    /// Inclusive lower bound (`YYYY-MM-DD HH:MM:SS`).
    #[arg(long)]
    start_date: Option<String>,
    /// Inclusive upper bound (`YYYY-MM-DD HH:MM:SS`).
    #[arg(long)]
    end_date: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self { message }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(&command),
        Commands::Config { command } => command_config(command),
        Commands::Store { command } => command_store(command),
        Commands::Query(command) => command_query(&command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
fn command_serve(command: &ConfigArg) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    logging::init(&config.logging).map_err(|err| CliError::new(err.to_string()))?;
    info!("starting orus service");

    let credentials = bootstrap::credential_provider(&config).map_err(startup_error)?;
    let services = bootstrap::prepare(&config, credentials.as_deref(), Arc::new(SystemClock))
        .map_err(startup_error)?;
    let settings =
        bootstrap::consumer_settings(&config, credentials.as_deref()).map_err(startup_error)?;
    let bind = config.server.bind_addr().map_err(|err| CliError::new(err.to_string()))?;
    let store = services.store.clone();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(format!("runtime init failed: {err}")))?;
    let outcome = runtime.block_on(serve(services, settings, bind, config.broker.queue_capacity));
    drop(runtime);
    store.close();
    outcome
}

/// Runs the API and, when configured, the consumer until one stops.
async fn serve(
    services: Services,
    settings: Option<ConsumerSettings>,
    bind: SocketAddr,
    queue_capacity: usize,
) -> CliResult<ExitCode> {
    let Some(settings) = settings else {
        info!("broker disabled; serving queries only");
        let status = ConsumerStatus::new(ConsumerState::Disabled);
        let server = bind_api(&services, status, bind).await?;
        server.run_until(shutdown_signal()).await.map_err(|err| CliError::new(err.to_string()))?;
        return Ok(ExitCode::SUCCESS);
    };

    let status = ConsumerStatus::default();
    let (queue, receiver) = IngestQueue::bounded(queue_capacity);
    let worker = IngestWorker::spawn(receiver, services.pipeline.clone())
        .map_err(|err| CliError::new(format!("ingest worker start failed: {err}")))?;
    let consumer = MqttConsumer::connect(&settings, queue, status.clone())
        .await
        .map_err(|err| CliError::new(err.to_string()))?;
    let server = bind_api(&services, status, bind).await?;
    let mut http = tokio::spawn(server.run_until(shutdown_signal()));

    let code = tokio::select! {
        result = consumer.run() => {
            http.abort();
            if let Err(err) = result {
                error!(error = %err, "ingestion consumer stopped");
            }
            ExitCode::FAILURE
        }
        joined = &mut http => match joined {
            Ok(Ok(())) => {
                info!("shutdown requested");
                ExitCode::SUCCESS
            }
            Ok(Err(err)) => {
                error!(error = %err, "http api stopped");
                ExitCode::FAILURE
            }
            Err(err) => {
                error!(error = %err, "http api task failed");
                ExitCode::FAILURE
            }
        },
    };

    match tokio::task::spawn_blocking(move || worker.join()).await {
        Ok(Ok(stats)) => info!(
            persisted = stats.persisted,
            rejected = stats.rejected,
            failed = stats.failed,
            "ingest worker drained"
        ),
        Ok(Err(err)) => error!(error = %err, "ingest worker failed"),
        Err(err) => error!(error = %err, "ingest worker join failed"),
    }
    Ok(code)
}

/// Binds the HTTP API.
async fn bind_api(
    services: &Services,
    status: ConsumerStatus,
    bind: SocketAddr,
) -> CliResult<ApiServer> {
    let state = ApiState::new(services.query.clone(), services.store.clone(), status);
    ApiServer::bind(bind, state).await.map_err(|err| CliError::new(err.to_string()))
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "signal handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => {
            load_config(command.config.as_deref())?;
            write_stdout_line("config ok")?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Store and Query Commands
// ============================================================================

/// Dispatches store subcommands.
fn command_store(command: StoreCommand) -> CliResult<ExitCode> {
    match command {
        StoreCommand::Init(command) => {
            let extra = command
                .tables
                .iter()
                .map(|name| {
                    TableId::parse(name)
                        .map_err(|err| CliError::new(format!("invalid table {name:?}: {err}")))
                })
                .collect::<CliResult<Vec<_>>>()?;
            if let Some(reserved) = extra.iter().find(|table| table.is_reserved()) {
                return Err(CliError::new(format!("{reserved} is a registry table")));
            }
            let config = load_config(command.config.config.as_deref())?;
            let store = open_configured_store(&config)?;
            bootstrap::bootstrap_tables(&store, &config, &extra).map_err(startup_error)?;
            let tables = bootstrap::load_tables(&store).map_err(startup_error)?;
            store.close();
            write_json(&tables.names())
        }
        StoreCommand::Tables(command) => {
            let config = load_config(command.config.as_deref())?;
            let store = open_configured_store(&config)?;
            let tables = bootstrap::load_tables(&store).map_err(startup_error)?;
            store.close();
            write_json(&tables.names())
        }
    }
}

/// Executes the `query` command.
fn command_query(command: &QueryCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let store = open_configured_store(&config)?;
    let tables = bootstrap::load_tables(&store).map_err(startup_error)?;
    let services = bootstrap::build_services(&config, store, tables, Arc::new(SystemClock));
    let filter = RawFilter {
        table_id: Some(command.table_id.clone()),
        start_date: command.start_date.clone(),
        end_date: command.end_date.clone(),
    };
    let outcome = services.query.handle(&filter);
    services.store.close();
    let result = outcome.map_err(|err| CliError::new(err.to_string()))?;
    write_json(&result)
}

/// Opens the store for an offline command; only the store needs secrets.
fn open_configured_store(config: &OrusConfig) -> CliResult<SharedMetricStore> {
    let credentials = match config.store.backend {
        StoreBackend::Postgres => {
            Some(config.credential_provider().map_err(|err| CliError::new(err.to_string()))?)
        }
        StoreBackend::Sqlite => None,
    };
    bootstrap::open_store(config, credentials.as_deref()).map_err(startup_error)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<OrusConfig> {
    OrusConfig::load(path).map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Maps a startup failure.
fn startup_error(err: bootstrap::BootstrapError) -> CliError {
    CliError::new(format!("startup failed: {err}"))
}

/// Writes a JSON document to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<ExitCode> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("json encode failed: {err}")))?;
    write_stdout_line(&text)?;
    Ok(ExitCode::SUCCESS)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(format!("stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    error!(error = %message, "command failed");
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
