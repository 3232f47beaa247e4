//! The telemetry-to-verdict inference pipeline

mod encode;
mod engine;
mod features;
mod inference;
mod scaler;

pub use encode::encode_aligned;
pub use engine::InferenceEngine;
pub use features::{coerce_booleans, engineer_features, FeatureSet, FieldValue, REQUIRED_FIELDS};
pub use inference::{Classifier, OnnxClassifier};
pub use scaler::RobustScaler;
