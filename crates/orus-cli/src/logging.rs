// crates/orus-cli/src/logging.rs
// ============================================================================
// Module: ORUS Logging Setup
// Description: Global tracing subscriber installation.
// Purpose: Route service events to stderr or an appended log file.
// Dependencies: orus-config, tracing-subscriber
// ============================================================================

//! ## Overview
//! The configured level is the default filter; `RUST_LOG` overrides it when
//! set. File output disables ANSI colors and appends, creating parent
//! directories as needed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use orus_config::LogFormat;
use orus_config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Logging setup failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be opened.
    #[error("log file error: {0}")]
    File(String),
    /// A global subscriber is already installed.
    #[error("logging init failed: {0}")]
    Install(String),
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Returns the effective filter for `config`.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingError`] when the log file cannot be opened or a
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config)).with_target(true);
    let installed = match (&config.file, config.format) {
        (None, LogFormat::Text) => builder.with_writer(io::stderr).try_init(),
        (None, LogFormat::Json) => builder.json().with_writer(io::stderr).try_init(),
        (Some(path), LogFormat::Text) => {
            builder.with_ansi(false).with_writer(Mutex::new(open_log_file(path)?)).try_init()
        }
        (Some(path), LogFormat::Json) => {
            builder.json().with_writer(Mutex::new(open_log_file(path)?)).try_init()
        }
    };
    installed.map_err(|err| LoggingError::Install(err.to_string()))
}

/// Opens `path` for appending.
///
/// # Errors
///
/// Returns [`LoggingError::File`] when the file or its directory cannot be
/// created.
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| LoggingError::File(format!("{}: {err}", parent.display())))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| LoggingError::File(format!("{}: {err}", path.display())))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use std::io::Write;

    use super::*;

    #[test]
    fn log_file_parent_is_created_and_appended() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("orus.log");
        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
