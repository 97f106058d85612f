// crates/orus-core/src/lib.rs
// ============================================================================
// Module: ORUS Core Library
// Description: Public API surface for the ORUS telemetry core.
// Purpose: Expose domain types, store interfaces, and pipeline runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! ORUS core implements the ingestion-and-query pipeline for device telemetry:
//! message normalization, the metric store contract, the argument sanitizer,
//! and the query service. It is backend-agnostic; relational stores plug in
//! through [`MetricStore`] and transports feed raw payloads into
//! [`IngestPipeline`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::MetricStore;
pub use interfaces::StoreError;
pub use runtime::ConsumerState;
pub use runtime::ConsumerStatus;
pub use runtime::DEFAULT_MAX_ROWS;
pub use runtime::FORBIDDEN_PATTERNS;
pub use runtime::InMemoryMetricStore;
pub use runtime::IngestError;
pub use runtime::IngestPipeline;
pub use runtime::IngestReport;
pub use runtime::Normalizer;
pub use runtime::QueryService;
pub use runtime::SanitizeError;
pub use runtime::ServiceError;
pub use runtime::SharedMetricStore;
pub use runtime::ValidationError;
pub use runtime::WriteMode;
pub use runtime::normalize;
pub use runtime::sanitize;
