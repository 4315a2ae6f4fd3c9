use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ReadingError;

pub const DEFAULT_DESCRIPTION: &str = "Clear sky";
pub const DEFAULT_ICON: &str = "default";

/// A point-in-time snapshot of weather measurements for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Air temperature, °C.
    pub temperature: f64,
    /// Relative humidity, %.
    pub humidity: f64,
    /// Wind speed, km/h.
    pub wind_speed: f64,
    pub uv_index: f64,
    /// Feels-like temperature, °C.
    pub apparent_temperature: f64,
    /// Precipitation, mm.
    pub precipitation: f64,
    /// Surface pressure, hPa.
    pub surface_pressure: f64,
    #[serde(rename = "weather_desc", alias = "description", default = "default_description")]
    pub description: String,
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

impl WeatherReading {
    /// Check that every numeric field is finite, reporting the first one that is not.
    pub fn validate(&self) -> Result<(), ReadingError> {
        let fields = [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("wind_speed", self.wind_speed),
            ("uv_index", self.uv_index),
            ("apparent_temperature", self.apparent_temperature),
            ("precipitation", self.precipitation),
            ("surface_pressure", self.surface_pressure),
        ];

        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some((name, _)) => Err(ReadingError::NonFinite(*name)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
    pub icon: String,
}

impl Recommendation {
    pub fn new(recommendation: impl Into<String>, icon: impl Into<String>) -> Self {
        Self { recommendation: recommendation.into(), icon: icon.into() }
    }
}

/// One geocoding match. Fields the service does not look at are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
pub(crate) fn reading(
    temperature: f64,
    precipitation: f64,
    uv_index: f64,
    description: &str,
) -> WeatherReading {
    WeatherReading {
        temperature,
        humidity: 50.0,
        wind_speed: 10.0,
        uv_index,
        apparent_temperature: temperature,
        precipitation,
        surface_pressure: 1013.0,
        description: description.to_string(),
    }
}
