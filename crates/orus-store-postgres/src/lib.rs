// crates/orus-store-postgres/src/lib.rs
// ============================================================================
// Module: ORUS Postgres Metric Store
// Description: MetricStore backend using a pooled Postgres connection.
// Purpose: Provide shared-server persistence for ORUS devices and readings.
// Dependencies: orus-core, postgres, r2d2, r2d2_postgres
// ============================================================================

//! ## Overview
//! This crate provides a Postgres-backed [`MetricStore`]. Each unit of work
//! borrows one connection from an r2d2 pool; the pool is built eagerly so an
//! unreachable server fails at startup.
//!
//! [`MetricStore`]: orus_core::MetricStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::PostgresMetricStore;
pub use store::PostgresStoreConfig;
pub use store::PostgresStoreError;
