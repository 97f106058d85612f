// crates/orus-core/src/core/mod.rs
// ============================================================================
// Module: ORUS Core Types
// Description: Canonical telemetry, identifier, time, and query structures.
// Purpose: Provide stable, serializable types shared by stores and transports.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types describe telemetry messages, metric tables, timestamps, and
//! query shapes. They are the single source of truth for the HTTP surface and
//! the store backends.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod message;
pub mod query;
pub mod statement;
pub mod tables;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::identifiers::ColumnName;
pub use self::identifiers::DEVICES_TABLE;
pub use self::identifiers::DeviceId;
pub use self::identifiers::IdentifierError;
pub use self::identifiers::METRIC_TYPES_TABLE;
pub use self::identifiers::MAX_TABLE_ID_LENGTH;
pub use self::identifiers::TableId;
pub use self::message::CLIENT_ID_KEY;
pub use self::message::MetricValue;
pub use self::message::TIMESTAMP_KEY;
pub use self::message::TelemetryMessage;
pub use self::message::VALUE_PRECISION_DIGITS;
pub use self::message::round_value;
pub use self::query::QueryFilter;
pub use self::query::QueryResult;
pub use self::query::RawFilter;
pub use self::query::Record;
pub use self::query::Row;
pub use self::query::StoredValue;
pub use self::query::TimeRange;
pub use self::statement::ReadStatement;
pub use self::statement::SqlDialect;
pub use self::statement::SqlParam;
pub use self::statement::insert_reading_sql;
pub use self::statement::metric_table_ddl;
pub use self::statement::quote_identifier;
pub use self::statement::register_device_sql;
pub use self::statement::register_metric_type_sql;
pub use self::statement::registry_table_ddl;
pub use self::tables::KnownTables;
pub use self::time::Clock;
pub use self::time::FixedClock;
pub use self::time::SystemClock;
pub use self::time::TIMESTAMP_FORMAT;
pub use self::time::Timestamp;
pub use self::time::TimestampError;
