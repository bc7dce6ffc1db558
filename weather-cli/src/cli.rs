use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use mqtt_weather_core::{
    Config, LatestValueCache, MqttBroker, PublishGateway, SubscriptionListener,
    provider::provider_from_config,
    server::{self, AppState},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "mqtt-weather", version, about = "Forecast to MQTT bridge")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to the broker and serve the HTTP API.
    Serve {
        /// Override the configured listen port.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Fetch and print the forecast for a city, without touching the broker.
    Show {
        /// City name; defaults to the configured default city.
        city: Option<String>,
    },

    /// Interactively set the API key, broker and default city.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let allow_missing = matches!(self.command, Command::Configure);
        let config = load_config(self.config.as_deref(), allow_missing)?;

        match self.command {
            Command::Serve { port } => serve(config, port).await,
            Command::Show { city } => show(&config, city).await,
            Command::Configure => configure(config, self.config),
        }
    }
}

/// Load the config named by `--config`, or the platform default.
///
/// Only `configure` may start from a file that does not exist yet.
fn load_config(path: Option<&Path>, allow_missing: bool) -> anyhow::Result<Config> {
    match path {
        Some(path) if allow_missing && !path.exists() => Ok(Config::default()),
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

async fn serve(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if config.api_key().is_none() {
        tracing::warn!("no provider API key configured; forecast requests will likely fail");
    }

    let (broker, event_loop) = MqttBroker::connect(&config.broker).await?;

    let cache = LatestValueCache::new();
    SubscriptionListener::new(
        broker.clone(),
        config.broker.topic.clone(),
        cache.clone(),
        config.broker.reconnect_delay(),
    )
    .spawn(event_loop);

    let gateway = PublishGateway::new(
        Arc::from(provider_from_config(&config)),
        Arc::new(broker),
        config.broker.topic.clone(),
        config.default_city.clone(),
    );

    let state = AppState {
        gateway: Arc::new(gateway),
        cache,
    };
    server::serve(state, &config.server).await
}

async fn show(config: &Config, city: Option<String>) -> anyhow::Result<()> {
    config.require_api_key()?;

    let city = city.unwrap_or_else(|| config.default_city.clone());
    let forecast = provider_from_config(config)
        .fetch(&city)
        .await
        .with_context(|| format!("Failed to fetch forecast for '{city}'"))?;

    println!("{forecast}");
    Ok(())
}

fn configure(mut config: Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    let api_key = Password::new("Forecast provider API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    config.broker.host = Text::new("MQTT broker host:")
        .with_default(&config.broker.host)
        .prompt()?;
    config.broker.topic = Text::new("MQTT topic:")
        .with_default(&config.broker.topic)
        .prompt()?;
    config.default_city = Text::new("Default city:")
        .with_default(&config.default_city)
        .prompt()?;

    let saved_to = match path {
        Some(path) => {
            config.save_to(&path)?;
            path
        }
        None => config.save()?,
    };
    println!("Configuration saved to {}", saved_to.display());
    Ok(())
}
