// crates/orus-broker/src/consumer.rs
// ============================================================================
// Module: ORUS MQTT Consumer
// Description: Broker connection, subscription, and event loop.
// Purpose: Deliver published payloads to the ingest queue.
// Dependencies: orus-config, orus-core, rumqttc, tokio
// ============================================================================

//! ## Overview
//! [`MqttConsumer::connect`] performs the startup handshake (CONNACK, then a
//! QoS 1 subscription acknowledged by SUBACK) under a timeout; any failure
//! there is fatal. [`MqttConsumer::run`] then polls until the transport
//! fails, at which point the status flips to `disconnected` and the error is
//! returned so the process can exit for an external restart.
//!
//! State: `disconnected -> connecting -> subscribed -> receiving`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use orus_config::BrokerConfig;
use orus_config::BrokerCredentials;
use orus_core::ConsumerState;
use orus_core::ConsumerStatus;
use rumqttc::AsyncClient;
use rumqttc::ConnectReturnCode;
use rumqttc::Event;
use rumqttc::EventLoop;
use rumqttc::MqttOptions;
use rumqttc::Packet;
use rumqttc::QoS;
use rumqttc::SubscribeReasonCode;
use rumqttc::Transport;
use thiserror::Error;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::queue::InboundMessage;
use crate::queue::IngestQueue;
use crate::queue::QueueError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Capacity of the client request channel.
const CLIENT_REQUEST_CAPACITY: usize = 16;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Connection settings for one consumer.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: orus_config::Secret,
    /// Topic filter.
    pub topic: String,
    /// MQTT client identifier.
    pub client_id: String,
    /// Use TLS.
    pub tls: bool,
    /// Keep-alive interval.
    pub keep_alive: Duration,
    /// Startup handshake timeout.
    pub connect_timeout: Duration,
}

impl ConsumerSettings {
    /// Combines broker options with resolved credentials.
    #[must_use]
    pub fn from_parts(config: &BrokerConfig, credentials: &BrokerCredentials) -> Self {
        Self {
            host: credentials.host.clone(),
            port: credentials.port,
            user: credentials.user.clone(),
            password: credentials.password.clone(),
            topic: credentials.topic.clone(),
            client_id: config.client_id.clone(),
            tls: config.tls,
            keep_alive: Duration::from_secs(config.keep_alive_secs),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
        }
    }

    fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options.set_credentials(self.user.clone(), self.password.expose().to_string());
        options.set_keep_alive(self.keep_alive);
        if self.tls {
            options.set_transport(Transport::tls_with_default_config());
        }
        options
    }
}

/// Consumer failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsumerError {
    /// The handshake did not finish within the connect timeout.
    #[error("broker handshake timed out during {0}")]
    Timeout(&'static str),
    /// The broker refused the connection or subscription.
    #[error("broker refused {0}")]
    Refused(String),
    /// Transport failure.
    #[error("broker transport error: {0}")]
    Transport(String),
}

/// Effect of one event on the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// A payload was queued for ingestion.
    Enqueued,
    /// A payload was dropped because the queue was full.
    Dropped,
    /// The event needs no action.
    Ignored,
    /// The broker ended the session.
    Disconnected,
}

/// Subscribed MQTT consumer.
pub struct MqttConsumer {
    /// Client handle; kept alive for the session.
    client: AsyncClient,
    /// Event loop driving the connection.
    eventloop: EventLoop,
    /// Destination queue.
    queue: IngestQueue,
    /// Observable state.
    status: ConsumerStatus,
}

// ============================================================================
// SECTION: Consumer
// ============================================================================

impl MqttConsumer {
    /// Connects, subscribes, and waits for both acknowledgements.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError`] when the broker is unreachable, refuses the
    /// session or subscription, or the handshake exceeds the timeout.
    pub async fn connect(
        settings: &ConsumerSettings,
        queue: IngestQueue,
        status: ConsumerStatus,
    ) -> Result<Self, ConsumerError> {
        status.set(ConsumerState::Connecting);
        info!(host = %settings.host, port = settings.port, tls = settings.tls, "connecting to broker");
        let (client, mut eventloop) =
            AsyncClient::new(settings.mqtt_options(), CLIENT_REQUEST_CAPACITY);

        let handshake = async {
            wait_for(&mut eventloop, &queue, &status, |packet| match packet {
                Packet::ConnAck(ack) if ack.code == ConnectReturnCode::Success => Some(Ok(())),
                Packet::ConnAck(_) => Some(Err(ConsumerError::Refused("connection".to_string()))),
                _ => None,
            })
            .await?;
            client
                .subscribe(settings.topic.clone(), QoS::AtLeastOnce)
                .await
                .map_err(|err| ConsumerError::Transport(err.to_string()))?;
            wait_for(&mut eventloop, &queue, &status, |packet| match packet {
                Packet::SubAck(ack)
                    if ack.return_codes.iter().all(|code| {
                        matches!(code, SubscribeReasonCode::Success(_))
                    }) =>
                {
                    Some(Ok(()))
                }
                Packet::SubAck(_) => Some(Err(ConsumerError::Refused("subscription".to_string()))),
                _ => None,
            })
            .await
        };

        let outcome = tokio::time::timeout(settings.connect_timeout, handshake)
            .await
            .unwrap_or(Err(ConsumerError::Timeout("connect")));
        if let Err(err) = outcome {
            status.set(ConsumerState::Disconnected);
            error!(error = %err, "broker connection failed");
            return Err(err);
        }

        status.set(ConsumerState::Subscribed);
        info!(topic = %settings.topic, "subscribed to telemetry topic");
        Ok(Self { client, eventloop, queue, status })
    }

    /// Returns the observable state handle.
    #[must_use]
    pub fn status(&self) -> ConsumerStatus {
        self.status.clone()
    }

    /// Polls the connection until it fails.
    ///
    /// # Errors
    ///
    /// Always returns [`ConsumerError::Transport`] once the session ends.
    pub async fn run(mut self) -> Result<(), ConsumerError> {
        loop {
            match self.eventloop.poll().await {
                Ok(event) => {
                    if handle_event(&event, &self.queue, &self.status) == EventOutcome::Disconnected
                    {
                        error!("broker closed the session");
                        return Err(ConsumerError::Transport("broker sent disconnect".to_string()));
                    }
                }
                Err(err) => {
                    self.status.set(ConsumerState::Disconnected);
                    error!(error = %err, "broker connection lost");
                    return Err(ConsumerError::Transport(err.to_string()));
                }
            }
        }
    }

    /// Sends a DISCONNECT to the broker.
    pub async fn disconnect(&self) {
        if let Err(err) = self.client.disconnect().await {
            debug!(error = %err, "broker disconnect request failed");
        }
        self.status.set(ConsumerState::Disconnected);
    }
}

/// Applies one transport event to the queue and status.
///
/// Publishes are queued; a full queue drops the payload with a warning.
#[must_use]
pub fn handle_event(event: &Event, queue: &IngestQueue, status: &ConsumerStatus) -> EventOutcome {
    let Event::Incoming(packet) = event else {
        return EventOutcome::Ignored;
    };
    match packet {
        Packet::Publish(publish) => {
            status.mark_receiving();
            let message =
                InboundMessage { topic: publish.topic.clone(), payload: publish.payload.clone() };
            match queue.offer(message) {
                Ok(()) => EventOutcome::Enqueued,
                Err(QueueError::Full) => {
                    warn!(
                        topic = %publish.topic,
                        dropped = queue.dropped(),
                        "ingest queue full; message dropped"
                    );
                    EventOutcome::Dropped
                }
                Err(QueueError::Closed) => {
                    error!(topic = %publish.topic, "ingest worker gone; message dropped");
                    EventOutcome::Dropped
                }
            }
        }
        Packet::Disconnect => {
            status.set(ConsumerState::Disconnected);
            EventOutcome::Disconnected
        }
        _ => EventOutcome::Ignored,
    }
}

/// Polls until `check` resolves a packet.
///
/// Publishes that arrive before the handshake completes (retained or
/// session messages) are queued like any other delivery.
async fn wait_for<F>(
    eventloop: &mut EventLoop,
    queue: &IngestQueue,
    status: &ConsumerStatus,
    check: F,
) -> Result<(), ConsumerError>
where
    F: FnMut(&Packet) -> Option<Result<(), ConsumerError>>,
{
    let mut check = check;
    loop {
        let event =
            eventloop.poll().await.map_err(|err| ConsumerError::Transport(err.to_string()))?;
        if let Some(result) = handshake_step(&event, queue, status, &mut check) {
            return result;
        }
    }
}

/// Applies one handshake event; returns the outcome once `check` resolves.
///
/// Publishes go to [`handle_event`]; a broker DISCONNECT ends the handshake.
pub fn handshake_step<F>(
    event: &Event,
    queue: &IngestQueue,
    status: &ConsumerStatus,
    check: &mut F,
) -> Option<Result<(), ConsumerError>>
where
    F: FnMut(&Packet) -> Option<Result<(), ConsumerError>>,
{
    let Event::Incoming(packet) = event else {
        return None;
    };
    match packet {
        Packet::Publish(_) => {
            let _ = handle_event(event, queue, status);
            None
        }
        Packet::Disconnect => {
            Some(Err(ConsumerError::Transport("broker sent disconnect".to_string())))
        }
        other => check(other),
    }
}
