// crates/orus-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starting point for operators and tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical `orus.toml` example. Every key is shown with its default value
//! except where a comment marks an alternative.

/// Returns a canonical example `orus.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8080"

[store]
backend = "sqlite"
path = "data/orus.db"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"
read_pool_size = 4
tables = ["TEMPERATURE", "HUMIDITY"]
# backend = "postgres"
# host = "localhost"
# port = 5432
# database = "orus"
# max_connections = 16
# connect_timeout_ms = 5000

[broker]
enabled = true
host = "localhost"
port = 8883
topic = "orus/telemetry"
client_id = "ORUS_API"
tls = true
keep_alive_secs = 30
queue_capacity = 1024
connect_timeout_ms = 5000

[query]
max_rows = 10000

[ingest]
write_mode = "atomic"

[credentials]
source = "file"
path = "data/credentials.toml"

[logging]
level = "info"
format = "text"
# file = "data/logs/orus.log"
"#,
    )
}
