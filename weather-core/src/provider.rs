use crate::{Config, Forecast, FetchError, provider::openweather::OpenWeatherClient};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of forecast data, queried by city name.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(&self, city: &str) -> Result<Forecast, FetchError>;
}

/// Construct the forecast provider from config.
///
/// A missing API key is not an error here; the provider's own response
/// decides whether a fetch succeeds.
pub fn provider_from_config(config: &Config) -> Box<dyn ForecastProvider> {
    Box::new(OpenWeatherClient::new(config.provider.clone()))
}
