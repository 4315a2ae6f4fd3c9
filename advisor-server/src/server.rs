use std::sync::Arc;

use advisor_core::{
    Config, DiagnosticSink, GeminiBackend, OpenMeteoGateway, RecommendationEngine,
    diagnostics::spawn_file_writer,
};
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::{self, AppState};

/// Build every component from `config` and serve until Ctrl-C.
///
/// A missing backend credential stops startup here instead of failing requests later.
pub async fn serve(config: Config, bind: Option<String>) -> Result<()> {
    let api_key = config.backend_api_key()?;
    let backend = GeminiBackend::new(api_key, &config.backend)
        .context("Failed to create generative backend client")?;
    let model = backend.model().to_string();

    let gateway = OpenMeteoGateway::new(config.upstream.clone())
        .context("Failed to create weather gateway")?;

    let diagnostics = match &config.diagnostics.log_file {
        Some(path) => {
            let (sink, rx) = DiagnosticSink::channel(config.diagnostics.channel_capacity);
            spawn_file_writer(path.clone(), rx);
            info!("Writing recommendation traces to {}", path.display());
            sink
        }
        None => DiagnosticSink::disabled(),
    };

    let engine = RecommendationEngine::from_config(Arc::new(backend), &config.backend)
        .with_diagnostics(diagnostics);

    let state = AppState { engine: Arc::new(engine), gateway: Arc::new(gateway) };
    let app = routes::router(state);

    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        %addr,
        model = %model,
        budget_secs = config.backend.timeout_secs,
        max_in_flight = config.backend.max_in_flight,
        "weather advisor listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("weather advisor stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
    }
}
