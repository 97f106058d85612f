// crates/orus-core/src/runtime/sanitizer.rs
// ============================================================================
// Module: ORUS Argument Sanitizer
// Description: Rejects filter values carrying SQL injection markers.
// Purpose: Screen client-supplied query arguments before any other check.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The sanitizer is a pattern screen, not an escaper: accepted values pass
//! through unchanged and rejected values never reach the store. Reads remain
//! parameterized regardless, so this is an additional fail-closed gate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// Substrings rejected in any filter value.
pub const FORBIDDEN_PATTERNS: [&str; 7] = [";", "--", "/*", "*/", "'", "\"", "#"];

/// Sanitizer rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    /// Value contained a forbidden pattern.
    #[error("value contains forbidden pattern {pattern:?}")]
    InjectionDetected {
        /// First matching pattern in [`FORBIDDEN_PATTERNS`] order.
        pattern: &'static str,
    },
}

/// Checks `value` against [`FORBIDDEN_PATTERNS`].
///
/// # Errors
///
/// Returns [`SanitizeError::InjectionDetected`] on the first matching pattern.
pub fn sanitize(value: &str) -> Result<(), SanitizeError> {
    match FORBIDDEN_PATTERNS.iter().copied().find(|pattern| value.contains(pattern)) {
        Some(pattern) => Err(SanitizeError::InjectionDetected { pattern }),
        None => Ok(()),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
