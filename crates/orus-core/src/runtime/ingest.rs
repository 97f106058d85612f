// crates/orus-core/src/runtime/ingest.rs
// ============================================================================
// Module: ORUS Ingestion Pipeline
// Description: Normalize-then-persist processing for one raw message.
// Purpose: Drive the normalizer and the store with per-message isolation.
// Dependencies: thiserror, tracing, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`IngestPipeline::process`] handles exactly one payload. A validation
//! failure writes nothing. On success the device is registered first, then
//! the readings are written either in one transaction ([`WriteMode::Atomic`])
//! or one commit per field ([`WriteMode::PerField`]). A store failure aborts
//! the remainder of that message only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::DeviceId;
use crate::interfaces::MetricStore;
use crate::interfaces::StoreError;
use crate::runtime::normalizer::Normalizer;
use crate::runtime::normalizer::ValidationError;
use crate::runtime::store::SharedMetricStore;

// ============================================================================
// SECTION: Types
// ============================================================================

/// How a message's readings are committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// All readings of a message commit together or not at all.
    #[default]
    Atomic,
    /// Each reading commits on its own; earlier fields survive a later failure.
    PerField,
}

/// Outcome of a successfully persisted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Reporting device.
    pub device_id: DeviceId,
    /// Number of readings written.
    pub written: usize,
}

/// Per-message ingestion failures.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The payload failed validation; nothing was written.
    #[error("message rejected: {0}")]
    Validation(#[from] ValidationError),
    /// A store call failed part-way through the message.
    #[error("store write failed for device {device_id} after {written} readings: {source}")]
    Store {
        /// Reporting device.
        device_id: DeviceId,
        /// Readings committed before the failure.
        written: usize,
        /// Underlying store error.
        source: StoreError,
    },
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Normalize-and-persist pipeline.
#[derive(Clone)]
pub struct IngestPipeline {
    /// Payload validator.
    normalizer: Normalizer,
    /// Destination store.
    store: SharedMetricStore,
    /// Commit granularity.
    mode: WriteMode,
}

impl IngestPipeline {
    /// Creates a pipeline.
    #[must_use]
    pub const fn new(normalizer: Normalizer, store: SharedMetricStore, mode: WriteMode) -> Self {
        Self { normalizer, store, mode }
    }

    /// Returns the commit granularity.
    #[must_use]
    pub const fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Processes one raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] for rejected payloads and
    /// [`IngestError::Store`] when persistence fails.
    pub fn process(&self, payload: &[u8]) -> Result<IngestReport, IngestError> {
        let message = self.normalizer.normalize(payload)?;
        let device_id = message.device_id.clone();
        let fail = |written: usize, source: StoreError| IngestError::Store {
            device_id: device_id.clone(),
            written,
            source,
        };

        self.store
            .register_device_if_absent(&message.device_id, message.received_at)
            .map_err(|err| fail(0, err))?;

        let written = match self.mode {
            WriteMode::Atomic => {
                if !message.readings.is_empty() {
                    self.store
                        .write_readings(&message.device_id, &message.readings, message.received_at)
                        .map_err(|err| fail(0, err))?;
                }
                message.readings.len()
            }
            WriteMode::PerField => {
                let mut written = 0;
                for reading in &message.readings {
                    self.store
                        .write_reading(&message.device_id, reading, message.received_at)
                        .map_err(|err| fail(written, err))?;
                    written += 1;
                }
                written
            }
        };

        debug!(device = %device_id, written, "persisted telemetry message");
        Ok(IngestReport { device_id, written })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
