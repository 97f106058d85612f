// crates/orus-api/src/server.rs
// ============================================================================
// Module: ORUS HTTP Server
// Description: Axum routes for readings, tables, and health.
// Purpose: Map query-service outcomes onto HTTP status codes.
// Dependencies: orus-core, axum, tokio
// ============================================================================

//! ## Overview
//! Routes:
//! - `GET /readings?table_id=&start_date=&end_date=`: 200 with an ordered JSON
//!   array of records, 400 for rejected filters, 500 when the store fails.
//!   `GET /OrusDashboard/API` serves the same handler for dashboard clients.
//! - `GET /tables`: 200 with the allow-listed table names.
//! - `GET /health`: 200 when the store answers, 503 otherwise.
//!
//! Failure bodies are a single JSON string describing the error, store cause
//! included.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use orus_core::ConsumerState;
use orus_core::ConsumerStatus;
use orus_core::MetricStore;
use orus_core::QueryService;
use orus_core::RawFilter;
use orus_core::SharedMetricStore;
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Readings path used by existing dashboard clients.
pub const DASHBOARD_READINGS_PATH: &str = "/OrusDashboard/API";

/// Prefix of every failure body.
const FAILURE_PREFIX: &str = "An error occurred while processing the request. Error:";

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    /// Validating query service.
    service: QueryService,
    /// Store checked by `/health`.
    store: SharedMetricStore,
    /// Ingestion consumer state reported by `/health`.
    consumer: ConsumerStatus,
}

impl ApiState {
    /// Creates handler state.
    #[must_use]
    pub const fn new(
        service: QueryService,
        store: SharedMetricStore,
        consumer: ConsumerStatus,
    ) -> Self {
        Self { service, store, consumer }
    }
}

/// Builds the route table.
#[must_use]
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/readings", get(get_readings))
        .route(DASHBOARD_READINGS_PATH, get(get_readings))
        .route("/tables", get(get_tables))
        .route("/health", get(get_health))
        .with_state(state)
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Bound HTTP server.
pub struct ApiServer {
    /// Accepting socket.
    listener: TcpListener,
    /// Route table.
    app: Router,
}

impl ApiServer {
    /// Binds `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Bind`] when the socket cannot be bound.
    pub async fn bind(addr: SocketAddr, state: ApiState) -> Result<Self, ApiError> {
        let listener =
            TcpListener::bind(addr).await.map_err(|err| ApiError::Bind(err.to_string()))?;
        Ok(Self { listener, app: router(state) })
    }

    /// Returns the bound address.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Bind`] when the socket address is unavailable.
    pub fn local_addr(&self) -> Result<SocketAddr, ApiError> {
        self.listener.local_addr().map_err(|err| ApiError::Bind(err.to_string()))
    }

    /// Serves requests until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Serve`] when the server loop fails.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "http api listening");
        }
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ApiError::Serve(err.to_string()))
    }
}

/// HTTP server failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Socket bind failure.
    #[error("http bind failed: {0}")]
    Bind(String),
    /// Server loop failure.
    #[error("http server failed: {0}")]
    Serve(String),
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Serves `GET /readings`.
async fn get_readings(
    State(state): State<ApiState>,
    query: Result<Query<RawFilter>, QueryRejection>,
) -> Response {
    let Query(filter) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.handle(&filter)).await;
    match outcome {
        Ok(Ok(result)) => (StatusCode::OK, Json(result)).into_response(),
        Ok(Err(err)) if err.is_client_error() => {
            warn!(error = %err, "readings request rejected");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        Ok(Err(err)) => {
            error!(error = %err, "readings query failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
        Err(err) => {
            error!(error = %err, "readings task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("query task failed: {err}"))
        }
    }
}

/// Serves `GET /tables`.
async fn get_tables(State(state): State<ApiState>) -> Json<Vec<String>> {
    Json(state.service.tables().names())
}

/// Health report body.
#[derive(Debug, Serialize)]
struct HealthReport {
    /// `ok` or `unavailable`.
    status: &'static str,
    /// `ready` or the store error.
    store: String,
    /// Ingestion consumer state.
    consumer: ConsumerState,
}

/// Serves `GET /health`.
async fn get_health(State(state): State<ApiState>) -> Response {
    let store = state.store.clone();
    let readiness = tokio::task::spawn_blocking(move || store.readiness())
        .await
        .map_err(|err| err.to_string())
        .and_then(|result| result.map_err(|err| err.to_string()));
    let consumer = state.consumer.get();
    let (code, report) = match readiness {
        Ok(()) => (
            StatusCode::OK,
            HealthReport { status: "ok", store: "ready".to_string(), consumer },
        ),
        Err(detail) => {
            warn!(error = %detail, "store not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthReport { status: "unavailable", store: detail, consumer },
            )
        }
    };
    (code, Json(report)).into_response()
}

/// Builds a failure response whose body is one descriptive JSON string.
fn error_response(code: StatusCode, detail: &str) -> Response {
    (code, Json(format!("{FAILURE_PREFIX} {detail}"))).into_response()
}
