//! Core library for the weather advisor service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Passthrough access to the upstream weather provider
//! - The recommendation engine and its rule-based fallback
//! - Shared domain models (readings, recommendations, locations)
//!
//! It is used by `advisor-server`, but has no HTTP-framework dependency of its own.

pub mod advisor;
pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod model;
pub mod prompt;
pub mod response;

pub use backend::{GeminiBackend, TextBackend};
pub use config::Config;
pub use diagnostics::DiagnosticSink;
pub use engine::RecommendationEngine;
pub use error::{BackendError, GatewayError, GenerationError, ReadingError};
pub use gateway::{OpenMeteoGateway, WeatherGateway};
pub use model::{Location, Recommendation, WeatherReading};
