// crates/orus-api/src/lib.rs
// ============================================================================
// Module: ORUS API Library
// Description: HTTP surface over the query service.
// Purpose: Serve readings, the table allow-list, and health over HTTP.
// Dependencies: orus-core, axum, tokio
// ============================================================================

//! ## Overview
//! `orus-api` exposes three read-only routes. Store calls are blocking and
//! run on the Tokio blocking pool so a slow read never stalls the reactor.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use server::ApiError;
pub use server::DASHBOARD_READINGS_PATH;
pub use server::ApiServer;
pub use server::ApiState;
pub use server::router;
