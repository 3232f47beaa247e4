//! Prometheus metrics for the inference service
//!
//! Registered once on the default registry and exposed through the
//! server's `/metrics` endpoint.

use prometheus::{
    register_gauge_vec, register_histogram, register_int_gauge, GaugeVec, Histogram, IntGauge,
};
use std::sync::OnceLock;

/// Histogram buckets for inference latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    inference_latency_seconds: Histogram,
    predictions_total: IntGauge,
    prediction_errors_total: IntGauge,
    batch_requests_total: IntGauge,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram!(
                "ml_server_inference_latency_seconds",
                "Time spent running the full prediction pipeline",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            predictions_total: register_int_gauge!(
                "ml_server_predictions_total",
                "Total number of successful predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_gauge!(
                "ml_server_prediction_errors_total",
                "Total number of requests answered with an error envelope"
            )
            .expect("Failed to register prediction_errors_total"),

            batch_requests_total: register_int_gauge!(
                "ml_server_batch_requests_total",
                "Total number of batch prediction requests"
            )
            .expect("Failed to register batch_requests_total"),

            model_info: register_gauge_vec!(
                "ml_server_model_info",
                "Information about the loaded model artifacts",
                &["model_type", "trained_at"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Lightweight handle to the global metrics instance.
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_inference_latency(&self, duration_secs: f64) {
        self.inner().inference_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn inc_batch_requests(&self) {
        self.inner().batch_requests_total.inc();
    }

    /// Record the loaded model's identity, resetting any previous value
    pub fn set_model_info(&self, model_type: &str, trained_at: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[model_type, trained_at])
            .set(1.0);
    }
}
