//! ML Server - EV battery thermal runaway prediction service
//!
//! Loads the pre-trained model artifact bundle at startup and serves
//! single and batch predictions over HTTP.

use anyhow::{Context, Result};
use ml_core::{InferenceEngine, ModelArtifacts, ServiceMetrics};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting ml-server");

    // Load configuration
    let config = config::ServerConfig::load()?;
    info!(
        port = config.port,
        artifact_dir = %config.artifact_dir,
        "Server configured"
    );

    // Load model artifacts; the service must not start without them
    let artifacts = ModelArtifacts::load(Path::new(&config.artifact_dir)).with_context(|| {
        format!(
            "failed to load model artifacts from {}",
            config.artifact_dir
        )
    })?;
    let artifacts = Arc::new(artifacts);

    // Initialize metrics
    let metrics = ServiceMetrics::new();
    metrics.set_model_info(&artifacts.metadata.model_type, &artifacts.metadata.trained_at);

    info!(
        model_type = %artifacts.metadata.model_type,
        accuracy = artifacts.metadata.accuracy,
        n_columns = artifacts.columns.len(),
        classes = ?artifacts.labels,
        "Model ready"
    );

    // Create shared application state
    let engine = InferenceEngine::new(artifacts);
    let app_state = Arc::new(api::AppState::new(engine, metrics));

    // Start the API server
    let cors = api::cors_layer(&config.cors_origins);
    let api_handle = tokio::spawn(api::serve(config.port, app_state, cors));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    api_handle.abort();

    Ok(())
}
