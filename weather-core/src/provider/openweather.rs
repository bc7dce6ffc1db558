use async_trait::async_trait;
use reqwest::Client;

use crate::{FetchError, Forecast, config::ProviderSettings};

use super::ForecastProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    settings: ProviderSettings,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            http: Client::new(),
        }
    }

    fn forecast_url(&self) -> String {
        format!("{}/forecast", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherClient {
    async fn fetch(&self, city: &str) -> Result<Forecast, FetchError> {
        let res = self
            .http
            .get(self.forecast_url())
            .query(&[
                ("q", city),
                ("appid", self.settings.api_key.as_str()),
                ("units", self.settings.units.as_str()),
                ("lang", self.settings.lang.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.bytes().await?;

        // The body decides success, not the status.
        if !status.is_success() {
            tracing::warn!(
                %status,
                city,
                body = %truncate_body(&String::from_utf8_lossy(&body)),
                "forecast provider returned non-success status"
            );
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
