use std::time::Duration;

use thiserror::Error;

/// Failure talking to the upstream weather/geocoding provider.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Failure of a single call to the generative-text backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no API key configured for the generative backend")]
    MissingCredential,

    #[error("request to generative backend failed: {0}")]
    Transport(String),

    #[error("generative backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed generative backend response: {0}")]
    Malformed(String),
}

/// Why the engine fell back to the rule-based advisor.
///
/// None of these reach the caller of `RecommendationEngine::generate`.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("backend output had no usable recommendation line")]
    MalformedOutput,

    #[error("too many backend calls in flight")]
    Saturated,

    #[error("backend task failed: {0}")]
    TaskFailed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadingError {
    #[error("field `{0}` must be a finite number")]
    NonFinite(&'static str),
}

/// Cut an upstream response body down to something fit for logs and error messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
