//! Core library for the battery telemetry inference service
//!
//! This crate provides:
//! - Feature engineering and schema alignment for raw readings
//! - The scaler/classifier adapter over pre-fit model artifacts
//! - Inference orchestration (single and batch) with reliability scoring
//! - The static advisory table
//! - Artifact bundle loading with checksum and manifest validation
//! - Prometheus metrics

pub mod advisory;
pub mod artifacts;
pub mod error;
pub mod models;
pub mod observability;
pub mod pipeline;

pub use artifacts::ModelArtifacts;
pub use error::{ArtifactError, PipelineError};
pub use models::*;
pub use observability::ServiceMetrics;
pub use pipeline::{Classifier, InferenceEngine};
