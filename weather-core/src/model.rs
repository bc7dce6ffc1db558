use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

/// Decoded 5-day forecast as returned by the provider.
///
/// Field names follow the provider's wire schema so the same struct is used
/// for decoding the upstream response and for the payload published to the
/// broker. Missing or `null` fields decode to empty values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: City,
    /// Forecast points in provider order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Display timestamp, e.g. "2024-01-01 12:00:00". Not parsed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub dt_txt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub main: Readings,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub temp: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub humidity: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Forecast {
    pub fn location_name(&self) -> &str {
        &self.city.name
    }

    pub fn entries(&self) -> &[ForecastEntry] {
        &self.list
    }

    /// The earliest forecast point, if the provider returned any.
    pub fn current(&self) -> Option<&ForecastEntry> {
        self.list.first()
    }

    /// Serialize back to the wire representation.
    pub fn to_payload(&self) -> serde_json::Result<Bytes> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

impl ForecastEntry {
    pub fn temperature_c(&self) -> f64 {
        self.main.temp
    }

    pub fn humidity_pct(&self) -> u8 {
        self.main.humidity
    }

    pub fn condition(&self) -> Option<&str> {
        self.weather.first().map(|w| w.description.as_str())
    }
}

/// Human-readable summary of the current forecast point.
impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "City: {}", self.location_name())?;

        let Some(current) = self.current() else {
            return write!(f, "No forecast data");
        };

        writeln!(f, "Temperature: {:.1}°C", current.temperature_c())?;
        writeln!(f, "Humidity: {}%", current.humidity_pct())?;
        writeln!(f, "Conditions: {}", current.condition().unwrap_or("Unknown"))?;
        write!(f, "Time: {}", current.dt_txt)
    }
}
