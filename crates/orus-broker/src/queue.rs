// crates/orus-broker/src/queue.rs
// ============================================================================
// Module: ORUS Ingest Queue
// Description: Bounded hand-off between the transport loop and the worker.
// Purpose: Decouple network delivery from blocking store writes.
// Dependencies: tokio, bytes
// ============================================================================

//! ## Overview
//! [`IngestQueue::offer`] never blocks: when the queue is full the payload is
//! counted as dropped and the caller moves on. The receiving half is drained
//! from a plain thread with `blocking_recv`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Raw payload received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the payload was published on.
    pub topic: String,
    /// Undecoded payload bytes.
    pub payload: Bytes,
}

/// Queue hand-off failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is at capacity; the message was dropped.
    #[error("ingest queue full")]
    Full,
    /// The worker has gone away.
    #[error("ingest queue closed")]
    Closed,
}

/// Receiving half handed to the worker.
pub type IngestReceiver = mpsc::Receiver<InboundMessage>;

/// Sending half used by the transport loop.
#[derive(Debug, Clone)]
pub struct IngestQueue {
    /// Channel sender.
    sender: mpsc::Sender<InboundMessage>,
    /// Messages dropped because the queue was full.
    dropped: Arc<AtomicU64>,
}

// ============================================================================
// SECTION: Queue
// ============================================================================

impl IngestQueue {
    /// Creates a queue holding at most `capacity` messages.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, IngestReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender, dropped: Arc::new(AtomicU64::new(0)) }, receiver)
    }

    /// Enqueues `message` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] when at capacity and
    /// [`QueueError::Closed`] when the receiver was dropped.
    pub fn offer(&self, message: InboundMessage) -> Result<(), QueueError> {
        match self.sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(QueueError::Full)
            }
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// Returns the number of messages dropped for lack of capacity.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Returns the queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
