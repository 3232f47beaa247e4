//! Core data models for the inference service

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw telemetry reading: an open field-name-to-value mapping.
///
/// No fixed field set is enforced at this boundary; unknown fields are
/// tolerated and dropped during schema alignment, missing required fields
/// surface as pipeline errors.
pub type RawReading = serde_json::Map<String, serde_json::Value>;

/// Coarse confidence bucket derived from the max class probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Reliability {
    High,
    Medium,
    Low,
}

impl Reliability {
    /// Bucket a confidence percentage. Both boundaries are strict:
    /// exactly 80.0 is Medium and exactly 60.0 is Low.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 80.0 {
            Reliability::High
        } else if confidence > 60.0 {
            Reliability::Medium
        } else {
            Reliability::Low
        }
    }
}

/// Static severity/action guidance attached to a predicted class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub emoji: &'static str,
    pub severity: &'static str,
    pub action: &'static str,
    pub color: &'static str,
}

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub prediction: String,
    pub solution: Advisory,
    pub confidence: f64,
    pub reliability: Reliability,
    /// Class label -> probability as a percentage, rounded to 2 decimals
    pub probabilities: BTreeMap<String, f64>,
    pub model_accuracy: f64,
}

/// Per-item output of a batch prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub prediction: String,
    pub confidence: f64,
    pub solution: Advisory,
}

/// Result of a batch prediction, results in input order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<BatchItem>,
    pub count: usize,
}

/// Importance of a single model column, recorded at training time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Training-time model metadata
///
/// Every field has a default so a partially written metadata artifact still
/// deserializes; a missing artifact falls back to `ModelMetadata::default()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default = "default_score")]
    pub accuracy: f64,
    #[serde(default = "default_score")]
    pub f1_score: f64,
    #[serde(default)]
    pub n_features: usize,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default = "default_trained_at")]
    pub trained_at: String,
    #[serde(default)]
    pub top_features: Vec<FeatureImportance>,
}

fn default_score() -> f64 {
    0.84
}

fn default_model_type() -> String {
    "Unknown".to_string()
}

fn default_trained_at() -> String {
    "Unknown".to_string()
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            accuracy: default_score(),
            f1_score: default_score(),
            n_features: 0,
            classes: Vec::new(),
            model_type: default_model_type(),
            trained_at: default_trained_at(),
            top_features: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reliability_boundaries_are_strict() {
        assert_eq!(Reliability::from_confidence(80.01), Reliability::High);
        assert_eq!(Reliability::from_confidence(80.0), Reliability::Medium);
        assert_eq!(Reliability::from_confidence(60.01), Reliability::Medium);
        assert_eq!(Reliability::from_confidence(60.0), Reliability::Low);
        assert_eq!(Reliability::from_confidence(0.0), Reliability::Low);
        assert_eq!(Reliability::from_confidence(100.0), Reliability::High);
    }

    #[test]
    fn test_reliability_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Reliability::High).unwrap(),
            "\"HIGH\""
        );
        assert_eq!(serde_json::to_string(&Reliability::Low).unwrap(), "\"LOW\"");
    }

    #[test]
    fn test_metadata_defaults() {
        let meta = ModelMetadata::default();
        assert_eq!(meta.accuracy, 0.84);
        assert_eq!(meta.f1_score, 0.84);
        assert!(meta.classes.is_empty());
    }

    #[test]
    fn test_metadata_partial_deserialization() {
        let meta: ModelMetadata = serde_json::from_str(r#"{"accuracy": 0.97}"#).unwrap();
        assert_eq!(meta.accuracy, 0.97);
        assert_eq!(meta.f1_score, 0.84);
        assert_eq!(meta.model_type, "Unknown");
    }
}
