// crates/orus-config/src/lib.rs
// ============================================================================
// Module: ORUS Config Library
// Description: Canonical config model, validation, and credential sources.
// Purpose: Single source of truth for orus.toml semantics.
// Dependencies: orus-core, orus-store-sqlite, orus-store-postgres, serde, toml
// ============================================================================

//! ## Overview
//! `orus-config` defines the configuration model for the ORUS telemetry
//! service. Loading is strict and fail-closed; secrets are resolved through a
//! [`CredentialProvider`] and never stored in the main config file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod credentials;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use credentials::*;
pub use examples::config_toml_example;
