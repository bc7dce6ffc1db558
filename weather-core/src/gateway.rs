use bytes::Bytes;
use std::sync::Arc;

use crate::{BrokerError, FetchError, Forecast, broker::Publisher, provider::ForecastProvider};

/// Result of a successful fetch-and-publish.
#[derive(Debug)]
pub struct Publication {
    pub forecast: Forecast,
    /// Wire JSON handed to the broker and returned to the caller.
    pub payload: Bytes,
    /// Outcome of the broker publish. Callers may ignore it.
    pub delivery: Result<(), BrokerError>,
}

/// Fetches a forecast and broadcasts it on the topic.
///
/// The listener on the same topic will eventually see the publish and update
/// the cache, but nothing here waits for that.
#[derive(Debug)]
pub struct PublishGateway {
    provider: Arc<dyn ForecastProvider>,
    publisher: Arc<dyn Publisher>,
    topic: String,
    default_city: String,
}

impl PublishGateway {
    pub fn new(
        provider: Arc<dyn ForecastProvider>,
        publisher: Arc<dyn Publisher>,
        topic: impl Into<String>,
        default_city: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            publisher,
            topic: topic.into(),
            default_city: default_city.into(),
        }
    }

    pub fn resolve_city<'a>(&'a self, city: &'a str) -> &'a str {
        if city.is_empty() { &self.default_city } else { city }
    }

    pub async fn publish_forecast(&self, city: &str) -> Result<Publication, FetchError> {
        let city = self.resolve_city(city);
        let forecast = self.provider.fetch(city).await?;

        if forecast.current().is_some() {
            tracing::info!("fetched forecast\n{forecast}");
        }

        let payload = forecast.to_payload()?;
        let delivery = self.publisher.publish(&self.topic, payload.clone()).await;
        match &delivery {
            Ok(()) => {
                tracing::info!(city = %forecast.location_name(), topic = %self.topic, "published forecast")
            }
            Err(err) => {
                tracing::warn!(city = %forecast.location_name(), error = %err, "forecast publish failed")
            }
        }

        Ok(Publication {
            forecast,
            payload,
            delivery,
        })
    }
}
