// crates/orus-broker/src/worker.rs
// ============================================================================
// Module: ORUS Ingest Worker
// Description: Dedicated thread draining the ingest queue.
// Purpose: Run blocking normalization and store writes off the transport loop.
// Dependencies: orus-core, tokio
// ============================================================================

//! ## Overview
//! One worker per process. Payloads are processed strictly in queue order.
//! A rejected payload is logged and discarded; a store failure is logged and
//! the worker moves on to the next payload. The worker exits when every
//! [`crate::IngestQueue`] sender has been dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::thread;
use std::thread::JoinHandle;

use orus_core::IngestError;
use orus_core::IngestPipeline;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::queue::IngestReceiver;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Thread name used for the worker.
const WORKER_THREAD_NAME: &str = "orus-ingest";

/// Counters reported when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Payloads persisted.
    pub persisted: u64,
    /// Payloads rejected by validation.
    pub rejected: u64,
    /// Payloads aborted by a store failure.
    pub failed: u64,
}

/// Handle to the running worker thread.
#[derive(Debug)]
pub struct IngestWorker {
    /// Join handle yielding final counters.
    handle: JoinHandle<WorkerStats>,
}

// ============================================================================
// SECTION: Worker
// ============================================================================

impl IngestWorker {
    /// Starts the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the thread cannot be spawned.
    pub fn spawn(receiver: IngestReceiver, pipeline: IngestPipeline) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || drain(receiver, &pipeline))?;
        Ok(Self { handle })
    }

    /// Returns true once the thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker to exit and returns its counters.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the worker thread panicked.
    pub fn join(self) -> io::Result<WorkerStats> {
        self.handle.join().map_err(|_| io::Error::other("ingest worker panicked"))
    }
}

/// Processes queued payloads until the channel closes.
fn drain(mut receiver: IngestReceiver, pipeline: &IngestPipeline) -> WorkerStats {
    let mut stats = WorkerStats::default();
    while let Some(message) = receiver.blocking_recv() {
        match pipeline.process(&message.payload) {
            Ok(report) => {
                stats.persisted += 1;
                info!(
                    device = %report.device_id,
                    readings = report.written,
                    topic = %message.topic,
                    "telemetry message stored"
                );
            }
            Err(IngestError::Validation(err)) => {
                stats.rejected += 1;
                warn!(topic = %message.topic, error = %err, "telemetry message discarded");
            }
            Err(err @ IngestError::Store { .. }) => {
                stats.failed += 1;
                error!(topic = %message.topic, error = %err, "telemetry message not stored");
            }
        }
    }
    info!(
        persisted = stats.persisted,
        rejected = stats.rejected,
        failed = stats.failed,
        "ingest worker stopped"
    );
    stats
}
