use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Connection settings for the MQTT broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Topic used for both subscribing and publishing.
    pub topic: String,
    pub keep_alive_secs: u64,
    /// Pause between event-loop polls after a connection error.
    pub reconnect_delay_secs: u64,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: "broker.hivemq.com".to_string(),
            port: 1883,
            client_id: "mqtt-weather-client".to_string(),
            topic: "rmbtech/interview/rug/yasser/weather_forecast".to_string(),
            keep_alive_secs: 30,
            reconnect_delay_secs: 5,
        }
    }
}

impl BrokerSettings {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

/// Forecast provider settings (OpenWeatherMap-compatible API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Empty means "not configured".
    pub api_key: String,
    pub base_url: String,
    pub units: String,
    pub lang: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            units: "metric".to_string(),
            lang: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served for every path not matched by the API routes.
    pub static_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: PathBuf::from("./static"),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_city = "jijel"
///
/// [provider]
/// api_key = "..."
///
/// [broker]
/// host = "broker.hivemq.com"
/// topic = "weather/forecast"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// City used when a request does not name one.
    pub default_city: String,
    pub broker: BrokerSettings,
    pub provider: ProviderSettings,
    pub server: ServerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_city: "jijel".to_string(),
            broker: BrokerSettings::default(),
            provider: ProviderSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Config {
    /// Load config from the platform config directory, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "mqtt-weather", "mqtt-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns the provider API key, if one is configured.
    pub fn api_key(&self) -> Option<&str> {
        Some(self.provider.api_key.as_str()).filter(|key| !key.trim().is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.provider.api_key = api_key;
    }

    /// Like [`Config::api_key`], but fails with a hint when the key is missing.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No API key configured for the forecast provider.\n\
                 Hint: run `mqtt-weather configure` and enter your API key."
            )
        })
    }
}
