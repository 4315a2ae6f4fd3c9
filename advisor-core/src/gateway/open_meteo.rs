use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    config::UpstreamConfig,
    error::{GatewayError, truncate_body},
    model::Location,
};

use super::WeatherGateway;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,apparent_temperature,precipitation,surface_pressure";
const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation_probability";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,uv_index_max,sunrise,sunset";

#[derive(Debug, Clone)]
pub struct OpenMeteoGateway {
    config: UpstreamConfig,
    http: Client,
}

impl OpenMeteoGateway {
    pub fn new(config: UpstreamConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Send a GET and return the body of a successful response.
    async fn fetch(&self, what: &str, url: &str, query: &[(&str, String)]) -> Result<String, GatewayError> {
        let res = self.http.get(url).query(query).send().await.map_err(|e| {
            upstream_error(format!("Failed to send request to Open-Meteo ({what}): {e}"))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            upstream_error(format!("Failed to read Open-Meteo {what} response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(upstream_error(format!(
                "Open-Meteo {what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Location>,
}

#[async_trait]
impl WeatherGateway for OpenMeteoGateway {
    async fn current_conditions(&self, latitude: f64, longitude: f64) -> Result<Value, GatewayError> {
        debug!(latitude, longitude, "fetching current conditions");

        let query = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ];
        let body = self.fetch("forecast", &self.config.forecast_url, &query).await?;

        serde_json::from_str(&body)
            .map_err(|e| upstream_error(format!("Failed to parse Open-Meteo forecast JSON: {e}")))
    }

    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, GatewayError> {
        debug!(query, "searching locations");

        let params = [
            ("name", query.to_string()),
            ("count", self.config.search_count.to_string()),
            ("language", self.config.language.clone()),
            ("format", "json".to_string()),
        ];
        let body = self.fetch("geocoding", &self.config.geocoding_url, &params).await?;

        let parsed: GeocodingResponse = serde_json::from_str(&body)
            .map_err(|e| upstream_error(format!("Failed to parse Open-Meteo geocoding JSON: {e}")))?;

        Ok(parsed.results)
    }
}

fn upstream_error(message: String) -> GatewayError {
    warn!("{message}");
    GatewayError::UpstreamUnavailable(message)
}
