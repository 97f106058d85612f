//! MQTT consumer event handling tests.
// crates/orus-broker/tests/consumer_events.rs
// ============================================================================
// Module: Consumer Event Tests
// Description: Transport events mapped onto the ingest queue and status.
// Purpose: Validate queueing, back-pressure, and state transitions offline.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::time::Duration;

use orus_broker::ConsumerError;
use orus_broker::ConsumerSettings;
use orus_broker::EventOutcome;
use orus_broker::IngestQueue;
use orus_broker::MqttConsumer;
use orus_broker::handle_event;
use orus_broker::handshake_step;
use orus_config::BrokerConfig;
use orus_config::BrokerCredentials;
use orus_config::Secret;
use orus_core::ConsumerState;
use orus_core::ConsumerStatus;
use rumqttc::ConnAck;
use rumqttc::ConnectReturnCode;
use rumqttc::Event;
use rumqttc::Outgoing;
use rumqttc::Packet;
use rumqttc::Publish;
use rumqttc::QoS;

fn publish(body: &str) -> Event {
    Event::Incoming(Packet::Publish(Publish::new("orus/telemetry", QoS::AtLeastOnce, body)))
}

#[test]
fn publish_is_enqueued_and_marks_receiving() {
    let (queue, mut receiver) = IngestQueue::bounded(8);
    let status = ConsumerStatus::new(ConsumerState::Subscribed);
    assert_eq!(handle_event(&publish(r#"{"CLIENT_ID":"dev1"}"#), &queue, &status), EventOutcome::Enqueued);
    assert_eq!(status.get(), ConsumerState::Receiving);
    let message = receiver.try_recv().unwrap();
    assert_eq!(message.topic, "orus/telemetry");
    assert_eq!(&message.payload[..], br#"{"CLIENT_ID":"dev1"}"#);
}

#[test]
fn full_queue_drops_without_blocking() {
    let (queue, mut receiver) = IngestQueue::bounded(1);
    let status = ConsumerStatus::new(ConsumerState::Subscribed);
    assert_eq!(handle_event(&publish("first"), &queue, &status), EventOutcome::Enqueued);
    assert_eq!(handle_event(&publish("second"), &queue, &status), EventOutcome::Dropped);
    assert_eq!(queue.dropped(), 1);
    assert_eq!(&receiver.try_recv().unwrap().payload[..], b"first");
    assert!(receiver.try_recv().is_err());
}

#[test]
fn control_packets_are_ignored() {
    let (queue, _receiver) = IngestQueue::bounded(1);
    let status = ConsumerStatus::new(ConsumerState::Subscribed);
    let connack = Event::Incoming(Packet::ConnAck(ConnAck::new(ConnectReturnCode::Success, false)));
    assert_eq!(handle_event(&connack, &queue, &status), EventOutcome::Ignored);
    assert_eq!(handle_event(&Event::Outgoing(Outgoing::PingReq), &queue, &status), EventOutcome::Ignored);
    assert_eq!(status.get(), ConsumerState::Subscribed);
}

fn connack_check(packet: &Packet) -> Option<Result<(), ConsumerError>> {
    match packet {
        Packet::ConnAck(_) => Some(Ok(())),
        _ => None,
    }
}

#[test]
fn publish_during_handshake_is_queued_not_discarded() {
    let (queue, mut receiver) = IngestQueue::bounded(4);
    let status = ConsumerStatus::new(ConsumerState::Connecting);
    let mut check = connack_check;

    assert!(handshake_step(&publish("early"), &queue, &status, &mut check).is_none());
    assert_eq!(&receiver.try_recv().unwrap().payload[..], b"early");
    assert_eq!(status.get(), ConsumerState::Connecting);

    let connack = Event::Incoming(Packet::ConnAck(ConnAck::new(ConnectReturnCode::Success, false)));
    assert_eq!(handshake_step(&connack, &queue, &status, &mut check), Some(Ok(())));
}

#[test]
fn disconnect_during_handshake_fails_it() {
    let (queue, _receiver) = IngestQueue::bounded(1);
    let status = ConsumerStatus::new(ConsumerState::Connecting);
    let outcome =
        handshake_step(&Event::Incoming(Packet::Disconnect), &queue, &status, &mut connack_check);
    assert!(matches!(outcome, Some(Err(ConsumerError::Transport(_)))));
    assert!(handshake_step(&Event::Outgoing(Outgoing::PingReq), &queue, &status, &mut connack_check).is_none());
}

#[test]
fn broker_disconnect_is_reported() {
    let (queue, _receiver) = IngestQueue::bounded(1);
    let status = ConsumerStatus::new(ConsumerState::Receiving);
    let outcome = handle_event(&Event::Incoming(Packet::Disconnect), &queue, &status);
    assert_eq!(outcome, EventOutcome::Disconnected);
    assert_eq!(status.get(), ConsumerState::Disconnected);
}

#[test]
fn settings_combine_config_and_credentials() {
    let config = BrokerConfig { tls: false, keep_alive_secs: 45, ..BrokerConfig::default() };
    let credentials = BrokerCredentials {
        host: "mqtt.local".to_string(),
        port: 1883,
        user: "api".to_string(),
        password: Secret::new("pw"),
        topic: "orus/#".to_string(),
    };
    let settings = ConsumerSettings::from_parts(&config, &credentials);
    assert_eq!(settings.host, "mqtt.local");
    assert_eq!(settings.client_id, "ORUS_API");
    assert_eq!(settings.keep_alive, Duration::from_secs(45));
    assert!(!settings.tls);
}

#[tokio::test]
async fn unreachable_broker_fails_at_startup() {
    let settings = ConsumerSettings {
        host: "127.0.0.1".to_string(),
        port: 1,
        user: "api".to_string(),
        password: Secret::new("pw"),
        topic: "orus/telemetry".to_string(),
        client_id: "ORUS_API".to_string(),
        tls: false,
        keep_alive: Duration::from_secs(30),
        connect_timeout: Duration::from_millis(500),
    };
    let (queue, _receiver) = IngestQueue::bounded(1);
    let status = ConsumerStatus::default();
    let result = MqttConsumer::connect(&settings, queue, status.clone()).await;
    assert!(matches!(
        result,
        Err(ConsumerError::Transport(_) | ConsumerError::Timeout(_))
    ));
    assert_eq!(status.get(), ConsumerState::Disconnected);
}
