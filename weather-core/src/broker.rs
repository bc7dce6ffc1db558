use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use std::fmt::Debug;

use crate::{BrokerError, config::BrokerSettings};

/// Every publish and subscription uses fire-and-forget delivery.
pub const QOS: QoS = QoS::AtMostOnce;

/// Capacity of the request channel between [`AsyncClient`] and its [`EventLoop`].
const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// Topic-based publish side of the message bus.
#[async_trait]
pub trait Publisher: Send + Sync + Debug {
    /// Hand `payload` to the broker client. Success means the request was
    /// accepted locally, not that any subscriber received it.
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), BrokerError>;
}

/// MQTT client handle. Requests are carried out by the paired [`EventLoop`],
/// which must be polled (see [`crate::listener::SubscriptionListener`]).
#[derive(Debug, Clone)]
pub struct MqttBroker {
    client: AsyncClient,
}

impl MqttBroker {
    /// Connect to the broker and wait for its CONNACK.
    ///
    /// Returns the client handle together with the event loop that owns the
    /// connection.
    pub async fn connect(settings: &BrokerSettings) -> Result<(Self, EventLoop), BrokerError> {
        let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
        options.set_keep_alive(settings.keep_alive());

        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(BrokerError::Connect(format!(
                            "{}:{} refused connection: {:?}",
                            settings.host, settings.port, ack.code
                        )));
                    }
                    tracing::info!(host = %settings.host, port = settings.port, "connected to MQTT broker");
                    return Ok((Self { client }, event_loop));
                }
                Ok(_) => continue,
                Err(err) => {
                    return Err(BrokerError::Connect(format!(
                        "{}:{}: {err}",
                        settings.host, settings.port
                    )));
                }
            }
        }
    }

    /// Wrap an existing client without waiting for a connection.
    pub fn from_client(client: AsyncClient) -> Self {
        Self { client }
    }

    /// Queue a subscription request without waiting for channel space.
    ///
    /// Called from the task that polls the event loop, so it must never block
    /// on the request channel that only that task drains.
    pub fn subscribe(&self, topic: &str) -> Result<(), BrokerError> {
        self.client
            .try_subscribe(topic, QOS)
            .map_err(|e| BrokerError::Subscribe(e.to_string()))
    }
}

#[async_trait]
impl Publisher for MqttBroker {
    /// Fails immediately when the request channel is full or closed, e.g. while
    /// the broker is unreachable and the event loop is waiting to reconnect.
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), BrokerError> {
        self.client
            .try_publish(topic, QOS, false, payload.to_vec())
            .map_err(|e| BrokerError::Publish(e.to_string()))
    }
}
