// crates/orus-store-sqlite/src/lib.rs
// ============================================================================
// Module: ORUS SQLite Metric Store
// Description: MetricStore backend using SQLite WAL.
// Purpose: Provide single-node persistence for ORUS devices and readings.
// Dependencies: orus-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`MetricStore`] implementation. Writes
//! go through one mutex-guarded connection; reads rotate over a small pool of
//! connections so queries do not queue behind ingestion under WAL.
//!
//! [`MetricStore`]: orus_core::MetricStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteJournalMode;
pub use store::SqliteMetricStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
