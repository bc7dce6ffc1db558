//! Background task that keeps the latest-value cache fed from the topic.

use rumqttc::{Event, EventLoop, Packet, SubscribeReasonCode};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::{BrokerError, LatestValueCache, broker::MqttBroker};

/// What the listener did with one event-loop event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    /// A message on the topic replaced the cached payload.
    Stored { len: usize },
    /// The client reconnected and the subscription was re-issued.
    Resubscribed,
    /// The client reconnected but the subscription request could not be queued.
    ResubscribeFailed,
    /// The broker rejected the subscription.
    SubscribeRejected,
    Ignored,
}

/// Feeds the cache from the topic.
///
/// The [`EventLoop`] is not part of the listener: it is owned by the task
/// that polls it and passed to [`SubscriptionListener::run`].
#[derive(Debug, Clone)]
pub struct SubscriptionListener {
    broker: MqttBroker,
    topic: String,
    cache: LatestValueCache,
    reconnect_delay: Duration,
}

impl SubscriptionListener {
    pub fn new(
        broker: MqttBroker,
        topic: impl Into<String>,
        cache: LatestValueCache,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            broker,
            topic: topic.into(),
            cache,
            reconnect_delay,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Queue the topic subscription. It is sent once the event loop is polled.
    pub fn subscribe(&self) -> Result<(), BrokerError> {
        self.broker.subscribe(&self.topic)
    }

    /// Subscribe and drive `event_loop` on a background task.
    ///
    /// A failed subscription is logged and the loop still runs; it is not retried
    /// until the next reconnect.
    pub fn spawn(self, event_loop: EventLoop) -> JoinHandle<()> {
        if let Err(err) = self.subscribe() {
            tracing::error!(topic = %self.topic, error = %err, "subscription error");
        }
        tokio::spawn(self.run(event_loop))
    }

    /// Poll the event loop forever. Connection errors are logged; the client
    /// reconnects on the next poll after `reconnect_delay`.
    pub async fn run(self, mut event_loop: EventLoop) {
        loop {
            match event_loop.poll().await {
                Ok(event) => {
                    self.handle_event(event);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "MQTT connection error, retrying");
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }

    /// Apply one event. Never waits on the broker client, since it runs on the
    /// task that drains the client's request channel.
    pub fn handle_event(&self, event: Event) -> Observed {
        match event {
            Event::Incoming(Packet::Publish(publish)) if publish.topic == self.topic => {
                let len = publish.payload.len();
                tracing::info!(topic = %publish.topic, bytes = len, "received new MQTT message");
                self.cache.set(publish.payload);
                Observed::Stored { len }
            }
            Event::Incoming(Packet::ConnAck(_)) => {
                tracing::info!("reconnected to MQTT broker");
                match self.subscribe() {
                    Ok(()) => Observed::Resubscribed,
                    Err(err) => {
                        tracing::error!(topic = %self.topic, error = %err, "subscription error");
                        Observed::ResubscribeFailed
                    }
                }
            }
            Event::Incoming(Packet::SubAck(ack))
                if ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure)) =>
            {
                tracing::error!(topic = %self.topic, "subscription error: broker rejected subscription");
                Observed::SubscribeRejected
            }
            _ => Observed::Ignored,
        }
    }
}
