// crates/orus-broker/src/lib.rs
// ============================================================================
// Module: ORUS Broker Library
// Description: MQTT ingestion consumer for ORUS telemetry.
// Purpose: Move payloads from the broker into the ingest pipeline.
// Dependencies: orus-core, orus-config, rumqttc, tokio
// ============================================================================

//! ## Overview
//! The transport loop ([`MqttConsumer`]) never touches the store. It pushes
//! raw payloads into a bounded [`IngestQueue`]; a dedicated [`IngestWorker`]
//! thread drains the queue in delivery order and runs each payload through
//! the ingest pipeline. A full queue drops the payload instead of stalling
//! the transport.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod consumer;
pub mod queue;
pub mod worker;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use consumer::ConsumerError;
pub use consumer::ConsumerSettings;
pub use consumer::EventOutcome;
pub use consumer::MqttConsumer;
pub use consumer::handle_event;
pub use consumer::handshake_step;
pub use queue::InboundMessage;
pub use queue::IngestQueue;
pub use queue::IngestReceiver;
pub use queue::QueueError;
pub use worker::IngestWorker;
pub use worker::WorkerStats;
