// crates/orus-core/src/core/message.rs
// ============================================================================
// Module: ORUS Telemetry Message
// Description: Normalized telemetry message and metric readings.
// Purpose: Carry validated device readings from the normalizer to the store.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`TelemetryMessage`] is the output of normalization: a device identifier,
//! the readings in payload order, and the receive timestamp. Its serialized
//! form mirrors the inbound envelope with an added `timestamp` key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::core::identifiers::DeviceId;
use crate::core::identifiers::TableId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Envelope key carrying the device identifier.
pub const CLIENT_ID_KEY: &str = "CLIENT_ID";
/// Key added to the normalized form for the receive time.
pub const TIMESTAMP_KEY: &str = "timestamp";
/// Decimal places kept for metric values.
pub const VALUE_PRECISION_DIGITS: usize = 3;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One metric field of a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    /// Destination metric table.
    pub table: TableId,
    /// Rounded value.
    pub value: f64,
}

/// Validated telemetry message.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryMessage {
    /// Reporting device.
    pub device_id: DeviceId,
    /// Readings in payload order.
    pub readings: Vec<MetricValue>,
    /// Receive time.
    pub received_at: Timestamp,
}

impl TelemetryMessage {
    /// Returns the reading for `table`, if present.
    #[must_use]
    pub fn reading(&self, table: &str) -> Option<f64> {
        self.readings.iter().find(|reading| reading.table.as_str() == table).map(|r| r.value)
    }
}

impl Serialize for TelemetryMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.readings.len() + 2))?;
        map.serialize_entry(CLIENT_ID_KEY, &self.device_id)?;
        for reading in &self.readings {
            map.serialize_entry(reading.table.as_str(), &reading.value)?;
        }
        map.serialize_entry(TIMESTAMP_KEY, &self.received_at)?;
        map.end()
    }
}

// ============================================================================
// SECTION: Rounding
// ============================================================================

/// Rounds `value` to [`VALUE_PRECISION_DIGITS`] places.
///
/// Rounding works on the exact decimal expansion of the float and breaks
/// exact ties toward the even digit, so `0.0625` becomes `0.062` while
/// `1.0005` (stored as `1.000499...`) becomes `1.0`.
#[must_use]
pub fn round_value(value: f64) -> f64 {
    format!("{value:.prec$}", prec = VALUE_PRECISION_DIGITS).parse().unwrap_or(value)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
