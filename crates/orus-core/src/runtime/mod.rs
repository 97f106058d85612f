// crates/orus-core/src/runtime/mod.rs
// ============================================================================
// Module: ORUS Runtime
// Description: Ingestion pipeline, query service, and supporting components.
// Purpose: Execute the normalize-persist and sanitize-query flows.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime wires the normalizer and sanitizer to a [`MetricStore`]:
//! [`IngestPipeline`] on the write side and [`QueryService`] on the read side.
//!
//! [`MetricStore`]: crate::interfaces::MetricStore

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod ingest;
pub mod normalizer;
pub mod query_service;
pub mod sanitizer;
pub mod status;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use ingest::IngestError;
pub use ingest::IngestPipeline;
pub use ingest::IngestReport;
pub use ingest::WriteMode;
pub use normalizer::Normalizer;
pub use normalizer::ValidationError;
pub use normalizer::normalize;
pub use query_service::DEFAULT_MAX_ROWS;
pub use query_service::QueryService;
pub use query_service::ServiceError;
pub use sanitizer::FORBIDDEN_PATTERNS;
pub use sanitizer::SanitizeError;
pub use sanitizer::sanitize;
pub use status::ConsumerState;
pub use status::ConsumerStatus;
pub use store::InMemoryMetricStore;
pub use store::SharedMetricStore;
