//! Error types for the inference pipeline and artifact loading

use thiserror::Error;

/// Errors raised while turning a raw reading into a prediction.
///
/// Every variant is caught at the request boundary and reported as the
/// in-band `{status: "error", message}` envelope; none of them crash a
/// request thread.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A raw field required by feature engineering is absent
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// A field that must be numeric carries a non-numeric value
    #[error("field '{0}' must be numeric")]
    NotNumeric(String),

    /// A field value cannot be encoded into the model schema
    #[error("field '{field}' has an unsupported value type for encoding")]
    SchemaAlignment { field: String },

    /// Vector width disagrees with the loaded scaler/classifier expectations.
    /// Indicates artifact corruption or version skew, not bad input.
    #[error("feature vector has {got} columns, model expects {expected}")]
    ArtifactMismatch { expected: usize, got: usize },

    /// The classifier ran but produced no usable probability output
    #[error("inference failed: {0}")]
    Inference(String),

    /// Single-predict payload was not a JSON object
    #[error("expected a JSON object of sensor fields")]
    NotAnObject,

    /// Batch payload was not a JSON array
    #[error("Expected array of readings")]
    NotASequence,
}

/// Errors raised while loading the model artifact bundle at startup.
///
/// All of these are fatal to the service except a missing or unreadable
/// metadata artifact, which falls back to defaults.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load classifier model: {0}")]
    Model(String),

    #[error("checksum mismatch for '{name}': expected {expected}, got {actual}")]
    Checksum {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("artifact bundle is inconsistent: {0}")]
    Inconsistent(String),
}
