// crates/orus-core/src/runtime/normalizer.rs
// ============================================================================
// Module: ORUS Message Normalizer
// Description: Validates raw telemetry payloads into normalized messages.
// Purpose: Enforce the allow-list and numeric typing before any store write.
// Dependencies: serde_json, thiserror, crate::core
// ============================================================================

//! ## Overview
//! Normalization is all-or-nothing. The payload must be a JSON object with a
//! non-empty string `CLIENT_ID`; every other key must be an allow-listed
//! metric table carrying a JSON number. Numbers are rounded to three decimals
//! and the message is stamped with the receive time. The first violation
//! rejects the whole message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::CLIENT_ID_KEY;
use crate::core::Clock;
use crate::core::DeviceId;
use crate::core::KnownTables;
use crate::core::MetricValue;
use crate::core::TelemetryMessage;
use crate::core::Timestamp;
use crate::core::round_value;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Per-message validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Payload was not a JSON object.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// `CLIENT_ID` was absent, not a string, or empty.
    #[error("missing or invalid CLIENT_ID")]
    MissingClientId,
    /// Key is not a known metric table.
    #[error("unknown field {0:?}")]
    UnknownField(String),
    /// Known metric carried a non-numeric value.
    #[error("invalid value for field {field:?}")]
    InvalidValue {
        /// Offending metric name.
        field: String,
    },
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes `payload` against `tables`, stamping `received_at`.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn normalize(
    payload: &[u8],
    tables: &KnownTables,
    received_at: Timestamp,
) -> Result<TelemetryMessage, ValidationError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|err| ValidationError::MalformedPayload(err.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ValidationError::MalformedPayload("payload is not a JSON object".to_string()));
    };

    let device_id = match fields.get(CLIENT_ID_KEY) {
        Some(Value::String(id)) if !id.is_empty() => DeviceId::new(id.as_str()),
        _ => return Err(ValidationError::MissingClientId),
    };

    let mut readings = Vec::with_capacity(fields.len().saturating_sub(1));
    for (key, value) in &fields {
        if key == CLIENT_ID_KEY {
            continue;
        }
        let Some(table) = tables.get(key) else {
            return Err(ValidationError::UnknownField(key.clone()));
        };
        let Some(number) = value.as_number().and_then(serde_json::Number::as_f64) else {
            return Err(ValidationError::InvalidValue { field: key.clone() });
        };
        readings.push(MetricValue { table: table.clone(), value: round_value(number) });
    }

    Ok(TelemetryMessage { device_id, readings, received_at })
}

/// Normalizer bound to an allow-list and a clock.
#[derive(Clone)]
pub struct Normalizer {
    /// Allow-listed metric tables.
    tables: KnownTables,
    /// Receive-time source.
    clock: Arc<dyn Clock>,
}

impl Normalizer {
    /// Creates a normalizer.
    #[must_use]
    pub fn new(tables: KnownTables, clock: Arc<dyn Clock>) -> Self {
        Self { tables, clock }
    }

    /// Normalizes `payload`, stamping it with the current clock time.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn normalize(&self, payload: &[u8]) -> Result<TelemetryMessage, ValidationError> {
        normalize(payload, &self.tables, self.clock.now())
    }

    /// Returns the allow-list.
    #[must_use]
    pub const fn tables(&self) -> &KnownTables {
        &self.tables
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
