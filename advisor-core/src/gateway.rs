use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::{error::GatewayError, model::Location};

pub mod open_meteo;

pub use open_meteo::OpenMeteoGateway;

/// Passthrough access to the upstream weather and geocoding provider.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    /// Current, hourly and daily blocks for a coordinate, as the provider returns them.
    async fn current_conditions(&self, latitude: f64, longitude: f64) -> Result<Value, GatewayError>;

    /// Location matches for a free-text query, in provider order.
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, GatewayError>;
}
