//! Core library for the `mqtt-weather` bridge.
//!
//! This crate defines:
//! - Configuration handling
//! - The forecast provider client and its domain model
//! - A latest-value cache fed by an MQTT topic subscription
//! - A gateway that fetches forecasts and publishes them to that topic
//! - The HTTP facade over both
//!
//! It is used by `mqtt-weather-cli`, but can also be embedded in other services.

pub mod broker;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod model;
pub mod provider;
pub mod query;
pub mod server;

pub use broker::{MqttBroker, Publisher};
pub use cache::LatestValueCache;
pub use config::Config;
pub use error::{BrokerError, FetchError};
pub use gateway::{Publication, PublishGateway};
pub use listener::SubscriptionListener;
pub use model::{Forecast, ForecastEntry};
pub use provider::ForecastProvider;
