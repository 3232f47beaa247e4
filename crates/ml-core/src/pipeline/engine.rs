//! Inference orchestration
//!
//! Composes the full chain for one reading: boolean coercion, feature
//! engineering, schema alignment, scaling, classification, then confidence
//! and reliability scoring with the advisory lookup. The batch variant
//! applies the same chain per item, all-or-nothing.

use super::encode::encode_aligned;
use super::features::{coerce_booleans, engineer_features};
use crate::advisory::advisory_for;
use crate::artifacts::ModelArtifacts;
use crate::error::PipelineError;
use crate::models::{BatchItem, BatchReport, PredictionReport, Reliability};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Stateless per call; the shared artifact bundle is read-only, so one
/// engine serves arbitrarily many concurrent requests without locking.
#[derive(Clone)]
pub struct InferenceEngine {
    artifacts: Arc<ModelArtifacts>,
}

impl InferenceEngine {
    pub fn new(artifacts: Arc<ModelArtifacts>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    /// Run the full pipeline for one raw reading.
    ///
    /// Errors are returned to the caller; the HTTP layer converts them into
    /// the in-band error envelope rather than a transport failure.
    pub fn predict(&self, payload: &Value) -> Result<PredictionReport, PipelineError> {
        let reading = payload.as_object().ok_or(PipelineError::NotAnObject)?;

        let mut reading = reading.clone();
        coerce_booleans(&mut reading);

        let features = engineer_features(&reading)?;
        let vector = encode_aligned(&features, &self.artifacts.columns);
        let scaled = self.artifacts.scaler.transform(&vector)?;
        let probabilities = self.artifacts.classifier.predict_proba(&scaled)?;

        let (class_index, max_probability) = argmax(&probabilities)
            .ok_or_else(|| PipelineError::Inference("empty probability output".to_string()))?;

        let prediction = self
            .artifacts
            .labels
            .get(class_index)
            .cloned()
            // Out-of-range indices cannot happen with a validated bundle,
            // but an unknown label must degrade to the UNKNOWN advisory
            // rather than fail the request
            .unwrap_or_else(|| format!("Class{}", class_index));

        let confidence = round2(f64::from(max_probability) * 100.0);
        let reliability = Reliability::from_confidence(confidence);

        let class_probabilities: BTreeMap<String, f64> = self
            .artifacts
            .labels
            .iter()
            .zip(probabilities.iter())
            .map(|(label, p)| (label.clone(), round2(f64::from(*p) * 100.0)))
            .collect();

        debug!(
            prediction = %prediction,
            confidence = confidence,
            reliability = ?reliability,
            "Prediction completed"
        );

        Ok(PredictionReport {
            solution: advisory_for(&prediction),
            prediction,
            confidence,
            reliability,
            probabilities: class_probabilities,
            model_accuracy: self.artifacts.metadata.accuracy,
        })
    }

    /// Run the pipeline over an ordered sequence of readings.
    ///
    /// All-or-nothing: the first failing item aborts the whole batch and the
    /// caller gets that single error, with no partial results. This matches
    /// the legacy service contract; see DESIGN.md before relaxing it.
    pub fn predict_batch(&self, payload: &Value) -> Result<BatchReport, PipelineError> {
        let readings = payload.as_array().ok_or(PipelineError::NotASequence)?;

        let mut results = Vec::with_capacity(readings.len());
        for reading in readings {
            let report = self.predict(reading)?;
            results.push(BatchItem {
                prediction: report.prediction,
                confidence: report.confidence,
                solution: report.solution,
            });
        }

        Ok(BatchReport {
            count: results.len(),
            results,
        })
    }
}

fn argmax(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ModelArtifacts;
    use crate::models::ModelMetadata;
    use crate::pipeline::{Classifier, RobustScaler};
    use serde_json::json;

    /// Classifier stub returning a fixed distribution
    #[derive(Debug)]
    struct FixedClassifier {
        num_features: usize,
        probs: Vec<f32>,
    }

    impl Classifier for FixedClassifier {
        fn num_features(&self) -> usize {
            self.num_features
        }
        fn num_classes(&self) -> usize {
            self.probs.len()
        }
        fn predict_proba(&self, scaled: &[f32]) -> Result<Vec<f32>, PipelineError> {
            if scaled.len() != self.num_features {
                return Err(PipelineError::ArtifactMismatch {
                    expected: self.num_features,
                    got: scaled.len(),
                });
            }
            Ok(self.probs.clone())
        }
    }

    fn model_columns() -> Vec<String> {
        [
            "MaxTemp_C",
            "MinTemp_C",
            "AmbientTemp_C",
            "PackVoltage_V",
            "DemandVoltage_V",
            "ChargeCurrent_A",
            "DemandCurrent_A",
            "ChargePower_kW",
            "SOC_%",
            "StateOfHealth_%",
            "InternalResistance_mOhm",
            "VibrationLevel_mg",
            "MoistureDetected",
            "TempRange",
            "TempDelta",
            "VoltageDiff",
            "CurrentDiff",
            "PowerDensity",
            "ThermalRisk",
            "HealthRisk",
            "CoolingSystem_Active",
            "CoolingSystem_Passive",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn identity_scaler(columns: &[String]) -> RobustScaler {
        RobustScaler {
            columns: columns.to_vec(),
            center: vec![0.0; columns.len()],
            scale: vec![1.0; columns.len()],
        }
    }

    fn engine_with(probs: Vec<f32>, labels: &[&str]) -> InferenceEngine {
        let columns = model_columns();
        let classifier = FixedClassifier {
            num_features: columns.len(),
            probs,
        };
        let artifacts = ModelArtifacts::assemble(
            columns.clone(),
            labels.iter().map(|s| s.to_string()).collect(),
            identity_scaler(&columns),
            Box::new(classifier),
            ModelMetadata::default(),
        )
        .unwrap();
        InferenceEngine::new(Arc::new(artifacts))
    }

    fn labels4() -> [&'static str; 4] {
        ["Alarm", "Runaway", "Warning", "Watch"]
    }

    fn sample_reading() -> Value {
        json!({
            "MaxTemp_C": 45,
            "MinTemp_C": 30,
            "AmbientTemp_C": 25,
            "PackVoltage_V": 400,
            "DemandVoltage_V": 398,
            "ChargeCurrent_A": 50,
            "DemandCurrent_A": 49,
            "ChargePower_kW": 20,
            "SOC_%": 50,
            "StateOfHealth_%": 95,
            "InternalResistance_mOhm": 40,
            "VibrationLevel_mg": 3,
            "MoistureDetected": false,
            "CoolingSystem": "Active"
        })
    }

    #[test]
    fn test_predict_end_to_end() {
        let engine = engine_with(vec![0.05, 0.7, 0.15, 0.1], &labels4());
        let report = engine.predict(&sample_reading()).unwrap();

        assert_eq!(report.prediction, "Runaway");
        assert_eq!(report.confidence, 70.0);
        assert_eq!(report.reliability, Reliability::Medium);
        assert_eq!(report.solution.severity, "CRITICAL");
        assert_eq!(report.model_accuracy, 0.84);
    }

    #[test]
    fn test_probabilities_sum_to_100() {
        let engine = engine_with(vec![0.05, 0.7, 0.15, 0.1], &labels4());
        let report = engine.predict(&sample_reading()).unwrap();

        let sum: f64 = report.probabilities.values().sum();
        assert!((sum - 100.0).abs() < 0.1, "sum was {}", sum);
        assert_eq!(report.probabilities["Runaway"], 70.0);
    }

    #[test]
    fn test_confidence_matches_max_probability() {
        let engine = engine_with(vec![0.21, 0.19, 0.35, 0.25], &labels4());
        let report = engine.predict(&sample_reading()).unwrap();

        let max = report
            .probabilities
            .values()
            .cloned()
            .fold(f64::MIN, f64::max);
        assert_eq!(report.confidence, max);
        assert_eq!(report.prediction, "Warning");
    }

    #[test]
    fn test_reliability_tiers() {
        let high = engine_with(vec![0.9, 0.05, 0.03, 0.02], &labels4());
        assert_eq!(
            high.predict(&sample_reading()).unwrap().reliability,
            Reliability::High
        );

        // Exactly 80.00 stays Medium, the boundary is exclusive
        let boundary = engine_with(vec![0.8, 0.1, 0.05, 0.05], &labels4());
        assert_eq!(
            boundary.predict(&sample_reading()).unwrap().reliability,
            Reliability::Medium
        );

        // Exactly 60.00 stays Low
        let low = engine_with(vec![0.6, 0.2, 0.1, 0.1], &labels4());
        assert_eq!(
            low.predict(&sample_reading()).unwrap().reliability,
            Reliability::Low
        );
    }

    #[test]
    fn test_predict_is_idempotent() {
        let engine = engine_with(vec![0.05, 0.7, 0.15, 0.1], &labels4());
        let first = engine.predict(&sample_reading()).unwrap();
        let second = engine.predict(&sample_reading()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_unknown_label_gets_unknown_advisory() {
        let engine = engine_with(
            vec![0.7, 0.1, 0.1, 0.1],
            &["Glitch", "Runaway", "Warning", "Watch"],
        );
        let report = engine.predict(&sample_reading()).unwrap();
        assert_eq!(report.prediction, "Glitch");
        assert_eq!(report.solution.severity, "UNKNOWN");
        assert_eq!(report.solution.emoji, "\u{2753}");
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let engine = engine_with(vec![0.25; 4], &labels4());
        assert!(matches!(
            engine.predict(&json!([1, 2, 3])).unwrap_err(),
            PipelineError::NotAnObject
        ));
        assert!(matches!(
            engine.predict(&json!(42)).unwrap_err(),
            PipelineError::NotAnObject
        ));
    }

    #[test]
    fn test_missing_field_propagates() {
        let engine = engine_with(vec![0.25; 4], &labels4());
        let mut reading = sample_reading();
        reading.as_object_mut().unwrap().remove("SOC_%");
        let err = engine.predict(&reading).unwrap_err();
        assert!(matches!(err, PipelineError::MissingField(ref f) if f == "SOC_%"));
    }

    #[test]
    fn test_batch_preserves_order() {
        let engine = engine_with(vec![0.05, 0.7, 0.15, 0.1], &labels4());
        let mut second = sample_reading();
        second
            .as_object_mut()
            .unwrap()
            .insert("MaxTemp_C".into(), json!(60));

        let batch = engine
            .predict_batch(&json!([sample_reading(), second]))
            .unwrap();
        assert_eq!(batch.count, 2);
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.results[0].prediction, "Runaway");
        assert_eq!(batch.results[1].prediction, "Runaway");
    }

    #[test]
    fn test_batch_aborts_on_first_failure() {
        let engine = engine_with(vec![0.05, 0.7, 0.15, 0.1], &labels4());
        let mut malformed = sample_reading();
        malformed.as_object_mut().unwrap().remove("MaxTemp_C");

        // A malformed sibling discards the valid reading too: the whole
        // batch fails with the underlying item error
        let err = engine
            .predict_batch(&json!([sample_reading(), malformed]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingField(ref f) if f == "MaxTemp_C"));
    }

    #[test]
    fn test_batch_rejects_non_array() {
        let engine = engine_with(vec![0.25; 4], &labels4());
        let err = engine.predict_batch(&sample_reading()).unwrap_err();
        assert!(matches!(err, PipelineError::NotASequence));
        assert_eq!(err.to_string(), "Expected array of readings");
    }

    #[test]
    fn test_empty_batch_succeeds() {
        let engine = engine_with(vec![0.25; 4], &labels4());
        let batch = engine.predict_batch(&json!([])).unwrap();
        assert_eq!(batch.count, 0);
        assert!(batch.results.is_empty());
    }
}
