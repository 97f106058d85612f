// crates/orus-cli/src/lib.rs
// ============================================================================
// Module: ORUS CLI Library
// Description: Startup wiring shared by the `orus` binary and its tests.
// Purpose: Keep store construction and logging setup testable.
// Dependencies: orus-config, orus-core, orus-store-sqlite, orus-store-postgres
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) parses arguments and dispatches;
//! everything that touches configuration, credentials, or stores lives here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bootstrap;
pub mod logging;
