// crates/orus-core/src/core/statement.rs
// ============================================================================
// Module: ORUS SQL Statements
// Description: Dialect-aware read statements and schema DDL.
// Purpose: Keep every SQL string the stores execute in one audited place.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Reads are built from a validated [`QueryFilter`]. The table identifier is
//! the only token interpolated into SQL text and is always double-quoted;
//! timestamps and the row cap are bound as positional parameters.
//!
//! Security posture: table names come from the startup allow-list and pass
//! [`TableId`] validation before reaching this module.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::DEVICES_TABLE;
use crate::core::identifiers::METRIC_TYPES_TABLE;
use crate::core::identifiers::TableId;
use crate::core::query::QueryFilter;
use crate::core::query::TimeRange;

// ============================================================================
// SECTION: Dialects
// ============================================================================

/// SQL placeholder and type dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// `SQLite` (`?N` placeholders).
    Sqlite,
    /// Postgres (`$N` placeholders).
    Postgres,
}

impl SqlDialect {
    /// Returns the 1-based positional placeholder.
    #[must_use]
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Sqlite => format!("?{index}"),
            Self::Postgres => format!("${index}"),
        }
    }

    /// Returns a placeholder with an explicit cast where the dialect needs one.
    ///
    /// Postgres cannot infer parameter types inside `INSERT ... SELECT` lists.
    #[must_use]
    pub fn typed_placeholder(self, index: usize, sql_type: &str) -> String {
        match self {
            Self::Sqlite => format!("?{index}"),
            Self::Postgres => format!("${index}::{sql_type}"),
        }
    }

    const fn id_column(self) -> &'static str {
        match self {
            Self::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Self::Postgres => "BIGSERIAL PRIMARY KEY",
        }
    }

    const fn integer_type(self) -> &'static str {
        match self {
            Self::Sqlite => "INTEGER",
            Self::Postgres => "BIGINT",
        }
    }

    const fn real_type(self) -> &'static str {
        match self {
            Self::Sqlite => "REAL",
            Self::Postgres => "DOUBLE PRECISION",
        }
    }
}

/// Bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    /// Text parameter.
    Text(String),
    /// Integer parameter.
    Integer(i64),
}

/// Parameterized metric-table read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStatement {
    /// SQL text.
    pub sql: String,
    /// Positional parameters.
    pub params: Vec<SqlParam>,
}

impl ReadStatement {
    /// Builds the bounded read for `filter`.
    #[must_use]
    pub fn build(dialect: SqlDialect, filter: &QueryFilter, max_rows: u32) -> Self {
        let mut sql = format!("SELECT * FROM {}", quote_identifier(&filter.table));
        let mut params = Vec::new();
        match filter.range {
            TimeRange::Unbounded => {}
            TimeRange::From(start) => {
                params.push(SqlParam::Text(start.to_text()));
                sql.push_str(&format!(" WHERE \"TIMESTAMP\" >= {}", dialect.placeholder(1)));
            }
            TimeRange::Between(start, end) => {
                params.push(SqlParam::Text(start.to_text()));
                params.push(SqlParam::Text(end.to_text()));
                sql.push_str(&format!(
                    " WHERE \"TIMESTAMP\" BETWEEN {} AND {}",
                    dialect.placeholder(1),
                    dialect.placeholder(2)
                ));
            }
        }
        params.push(SqlParam::Integer(i64::from(max_rows)));
        sql.push_str(&format!(
            " ORDER BY \"TIMESTAMP\", \"ID\" LIMIT {}",
            dialect.placeholder(params.len())
        ));
        Self { sql, params }
    }
}

// ============================================================================
// SECTION: Identifiers and DDL
// ============================================================================

/// Double-quotes a validated table identifier.
#[must_use]
pub fn quote_identifier(table: &TableId) -> String {
    format!("\"{}\"", table.as_str())
}

/// Insert-or-ignore for the device registry: `(CHIP_ID, REGISTERED_AT)`.
#[must_use]
pub fn register_device_sql(dialect: SqlDialect) -> String {
    format!(
        "INSERT INTO \"{DEVICES_TABLE}\" (\"CHIP_ID\", \"REGISTERED_AT\") VALUES ({}, {}) ON \
         CONFLICT(\"CHIP_ID\") DO NOTHING",
        dialect.placeholder(1),
        dialect.placeholder(2)
    )
}

/// Insert-or-ignore for a metric type: `(NAME)`.
#[must_use]
pub fn register_metric_type_sql(dialect: SqlDialect) -> String {
    format!(
        "INSERT INTO \"{METRIC_TYPES_TABLE}\" (\"NAME\") VALUES ({}) ON CONFLICT(\"NAME\") DO \
         NOTHING",
        dialect.placeholder(1)
    )
}

/// Reading insert resolving the metric type in the same statement.
///
/// Parameters: `(CHIP_ID, VALUE, TIMESTAMP, metric name)`. Zero affected rows
/// means the metric type is not registered.
#[must_use]
pub fn insert_reading_sql(dialect: SqlDialect, table: &TableId) -> String {
    format!(
        "INSERT INTO {} (\"CHIP_ID\", \"TYPE_ID\", \"VALUE\", \"TIMESTAMP\") SELECT {}, \
         \"TYPE_ID\", {}, {} FROM \"{METRIC_TYPES_TABLE}\" WHERE \"NAME\" = {}",
        quote_identifier(table),
        dialect.typed_placeholder(1, "TEXT"),
        dialect.typed_placeholder(2, dialect.real_type()),
        dialect.typed_placeholder(3, "TEXT"),
        dialect.placeholder(4)
    )
}

/// Returns the DDL creating the device and metric-type registries.
#[must_use]
pub fn registry_table_ddl(dialect: SqlDialect) -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS \"{DEVICES_TABLE}\" (\"CHIP_ID\" TEXT PRIMARY KEY, \
             \"REGISTERED_AT\" TEXT NOT NULL)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS \"{METRIC_TYPES_TABLE}\" (\"TYPE_ID\" {} PRIMARY KEY, \
             \"NAME\" TEXT NOT NULL UNIQUE)",
            match dialect {
                SqlDialect::Sqlite => "INTEGER",
                SqlDialect::Postgres => "SERIAL",
            }
        ),
    ]
}

/// Returns the DDL creating one metric table.
#[must_use]
pub fn metric_table_ddl(dialect: SqlDialect, table: &TableId) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\"ID\" {}, \"CHIP_ID\" TEXT NOT NULL, \"TYPE_ID\" {} NOT \
         NULL, \"VALUE\" {} NOT NULL, \"TIMESTAMP\" TEXT NOT NULL)",
        quote_identifier(table),
        dialect.id_column(),
        dialect.integer_type(),
        dialect.real_type()
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================
