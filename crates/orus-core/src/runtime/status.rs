// crates/orus-core/src/runtime/status.rs
// ============================================================================
// Module: ORUS Consumer Status
// Description: Observable ingestion consumer state.
// Purpose: Share transport state between the consumer and health checks.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The consumer walks `Disconnected -> Connecting -> Subscribed -> Receiving`
//! and drops back to `Disconnected` on a fatal transport error.
//! [`ConsumerStatus`] publishes the current state lock-free.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use serde::Serialize;

// ============================================================================
// SECTION: Consumer State
// ============================================================================

/// Ingestion consumer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerState {
    /// Not connected; initial and terminal state.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Connected and subscribed, no message yet.
    Subscribed,
    /// At least one message received.
    Receiving,
    /// Ingestion is turned off by configuration.
    Disabled,
}

impl ConsumerState {
    /// Encodes the state for atomic storage.
    const fn to_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Subscribed => 2,
            Self::Receiving => 3,
            Self::Disabled => 4,
        }
    }

    /// Decodes an atomic state value.
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Subscribed,
            3 => Self::Receiving,
            4 => Self::Disabled,
            _ => Self::Disconnected,
        }
    }

    /// Returns the snake-case state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Receiving => "receiving",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle to the consumer state.
#[derive(Debug, Clone)]
pub struct ConsumerStatus(Arc<AtomicU8>);

impl Default for ConsumerStatus {
    fn default() -> Self {
        Self::new(ConsumerState::Disconnected)
    }
}

impl ConsumerStatus {
    /// Creates a status handle starting at `state`.
    #[must_use]
    pub fn new(state: ConsumerState) -> Self {
        Self(Arc::new(AtomicU8::new(state.to_u8())))
    }

    /// Returns the current state.
    #[must_use]
    pub fn get(&self) -> ConsumerState {
        ConsumerState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Stores a new state.
    pub fn set(&self, state: ConsumerState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }

    /// Moves `Subscribed` to `Receiving`; other states are left alone.
    pub fn mark_receiving(&self) {
        let _ = self.0.compare_exchange(
            ConsumerState::Subscribed.to_u8(),
            ConsumerState::Receiving.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_are_shared_between_clones() {
        let status = ConsumerStatus::default();
        let observer = status.clone();
        assert_eq!(observer.get(), ConsumerState::Disconnected);
        status.set(ConsumerState::Connecting);
        status.mark_receiving();
        assert_eq!(observer.get(), ConsumerState::Connecting);
        status.set(ConsumerState::Subscribed);
        status.mark_receiving();
        assert_eq!(observer.get(), ConsumerState::Receiving);
        assert_eq!(observer.get().to_string(), "receiving");
    }
}
