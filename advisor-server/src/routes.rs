use std::sync::Arc;

use advisor_core::{
    GatewayError, Location, Recommendation, RecommendationEngine, WeatherGateway, WeatherReading,
};
use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub gateway: Arc<dyn WeatherGateway>,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { detail: detail.into() }))
}

/// Extractor rejections get the JSON error body too. Malformed input is a 422;
/// other rejections (wrong content type, oversized body) keep their status.
fn rejected(status: StatusCode, detail: String) -> ApiError {
    let status = if status == StatusCode::BAD_REQUEST {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        status
    };
    api_error(status, detail)
}

fn query_rejected(rejection: QueryRejection) -> ApiError {
    rejected(rejection.status(), rejection.body_text())
}

fn json_rejected(rejection: JsonRejection) -> ApiError {
    rejected(rejection.status(), rejection.body_text())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatesQuery {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    query: String,
}

async fn current_weather(
    State(state): State<AppState>,
    query: Result<Query<CoordinatesQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(q) = query.map_err(query_rejected)?;
    state
        .gateway
        .current_conditions(q.lat, q.lon)
        .await
        .map(Json)
        .map_err(|e| upstream_failure("Error fetching weather data", e))
}

async fn search_locations(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Location>>, ApiError> {
    let Query(q) = query.map_err(query_rejected)?;
    state
        .gateway
        .search_locations(&q.query)
        .await
        .map(Json)
        .map_err(|e| upstream_failure("Error searching location", e))
}

async fn generate_recommendation(
    State(state): State<AppState>,
    body: Result<Json<WeatherReading>, JsonRejection>,
) -> Result<Json<Recommendation>, ApiError> {
    let Json(reading) = body.map_err(json_rejected)?;
    reading
        .validate()
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    Ok(Json(state.engine.generate(&reading).await))
}

fn upstream_failure(what: &str, err: GatewayError) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{what}: {err}"))
}

/// Endpoints are served at the root and again under `/api`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/weather/current", get(current_weather))
        .route("/weather/search", get(search_locations))
        .route("/recommendations/generate", post(generate_recommendation));

    Router::new().merge(api.clone()).nest("/api", api).with_state(state)
}
