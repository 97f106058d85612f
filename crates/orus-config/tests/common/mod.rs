// crates/orus-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across orus-config integration tests.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use orus_config::ConfigError;
use orus_config::OrusConfig;

/// Parses and validates a TOML string.
pub fn config_from_toml(toml_str: &str) -> Result<OrusConfig, ConfigError> {
    OrusConfig::from_toml(toml_str)
}

/// Returns a config with all defaults applied.
pub fn minimal_config() -> Result<OrusConfig, ConfigError> {
    config_from_toml("")
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
