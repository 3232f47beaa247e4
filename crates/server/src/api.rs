//! HTTP API: prediction endpoints, health, model info, and Prometheus metrics
//!
//! Prediction endpoints keep the legacy wire contract: errors are reported
//! in-band as `{status: "error", message}` with HTTP 200, never as a
//! transport-level failure.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use ml_core::{InferenceEngine, PredictionReport, ServiceMetrics};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: InferenceEngine,
    pub metrics: ServiceMetrics,
}

impl AppState {
    pub fn new(engine: InferenceEngine, metrics: ServiceMetrics) -> Self {
        Self { engine, metrics }
    }
}

/// Success envelope for the single-predict path
#[derive(Serialize)]
struct PredictEnvelope<'a> {
    status: &'static str,
    #[serde(flatten)]
    report: PredictionReport,
    input_data: &'a Value,
}

fn error_envelope(message: String) -> Json<Value> {
    Json(json!({ "status": "error", "message": message }))
}

/// Predict battery status from one sensor reading
async fn predict(State(state): State<Arc<AppState>>, Json(payload): Json<Value>) -> impl IntoResponse {
    let start = Instant::now();
    let result = state.engine.predict(&payload);
    state
        .metrics
        .observe_inference_latency(start.elapsed().as_secs_f64());

    match result {
        Ok(report) => {
            state.metrics.inc_predictions();
            Json(
                serde_json::to_value(PredictEnvelope {
                    status: "success",
                    report,
                    input_data: &payload,
                })
                .unwrap_or_else(|_| json!({"status": "error", "message": "serialization failed"})),
            )
        }
        Err(e) => {
            state.metrics.inc_prediction_errors();
            warn!(error = %e, "Prediction request failed");
            error_envelope(e.to_string())
        }
    }
}

/// Predict multiple readings at once (all-or-nothing)
async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let start = Instant::now();
    state.metrics.inc_batch_requests();
    let result = state.engine.predict_batch(&payload);
    state
        .metrics
        .observe_inference_latency(start.elapsed().as_secs_f64());

    match result {
        Ok(batch) => Json(json!({
            "status": "success",
            "results": batch.results,
            "count": batch.count,
        })),
        Err(e) => {
            state.metrics.inc_prediction_errors();
            warn!(error = %e, "Batch prediction request failed");
            error_envelope(e.to_string())
        }
    }
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Artifacts load before the server starts, so both flags hold whenever
    // this endpoint answers; the shape matches the legacy service
    let _ = &state.engine;
    Json(json!({
        "status": "healthy",
        "model_loaded": true,
        "scaler_loaded": true,
    }))
}

/// Model metadata and performance info
async fn model_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let artifacts = state.engine.artifacts();
    let metadata = &artifacts.metadata;
    Json(json!({
        "status": "success",
        "model_type": metadata.model_type,
        "accuracy": metadata.accuracy,
        "f1_score": metadata.f1_score,
        "n_features": metadata.n_features,
        "classes": metadata.classes,
        "trained_at": metadata.trained_at,
        "top_features": metadata.top_features,
        "loaded_at": artifacts.loaded_at,
    }))
}

/// API documentation endpoint
async fn index() -> impl IntoResponse {
    Json(json!({
        "name": "EV Battery Thermal Runaway Prediction API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "online",
        "model_loaded": true,
        "endpoints": {
            "POST /api/predict": "Predict battery status from sensor data",
            "POST /api/predict/batch": "Batch predict multiple readings",
            "GET /api/model/info": "Get model information",
            "GET /api/health": "Health check",
            "GET /metrics": "Prometheus metrics",
        }
    }))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, Vec::new()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Build the CORS layer from the configured origins
pub fn cors_layer(origins: &str) -> CorsLayer {
    if origins.trim() == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api", get(index))
        .route("/api/predict", post(predict))
        .route("/api/predict/batch", post(predict_batch))
        .route("/api/health", get(health))
        .route("/api/model/info", get(model_info))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>, cors: CorsLayer) -> anyhow::Result<()> {
    let app = create_router(state).layer(cors);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
