//! Classifier adapter over a pre-fit ONNX model using tract
//!
//! The classifier is exported from the training job with a probability
//! output; at call time this adapter is stateless, its only state is the
//! loaded artifact.

use crate::error::{ArtifactError, PipelineError};
use tract_onnx::prelude::*;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A pre-fit classifier mapping one scaled feature vector to a probability
/// distribution over the known classes.
///
/// Implementations must be safe to share read-only across concurrent
/// requests; nothing here mutates after load.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Width of the scaled input vector the model was fitted against
    fn num_features(&self) -> usize;

    /// Number of classes in the probability output
    fn num_classes(&self) -> usize;

    /// Probability distribution over classes, one entry per known label,
    /// summing to 1 within floating tolerance
    fn predict_proba(&self, scaled: &[f32]) -> Result<Vec<f32>, PipelineError>;
}

/// ONNX-backed classifier using tract for lightweight inference
#[derive(Debug)]
pub struct OnnxClassifier {
    model: TractModel,
    num_features: usize,
    num_classes: usize,
}

impl OnnxClassifier {
    /// Load and optimize an ONNX classifier from bytes.
    ///
    /// The graph must accept a `[1, num_features]` f32 input and expose a
    /// probability output of width `num_classes`.
    pub fn from_bytes(
        bytes: &[u8],
        num_features: usize,
        num_classes: usize,
    ) -> Result<Self, ArtifactError> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(bytes))
            .map_err(|e| ArtifactError::Model(format!("failed to parse ONNX model: {}", e)))?
            .with_input_fact(0, f32::fact([1, num_features]).into())
            .map_err(|e| ArtifactError::Model(format!("failed to set input shape: {}", e)))?
            .into_optimized()
            .map_err(|e| ArtifactError::Model(format!("failed to optimize model: {}", e)))?
            .into_runnable()
            .map_err(|e| ArtifactError::Model(format!("failed to create runnable model: {}", e)))?;

        Ok(Self {
            model,
            num_features,
            num_classes,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn predict_proba(&self, scaled: &[f32]) -> Result<Vec<f32>, PipelineError> {
        if scaled.len() != self.num_features {
            return Err(PipelineError::ArtifactMismatch {
                expected: self.num_features,
                got: scaled.len(),
            });
        }

        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, self.num_features), scaled.to_vec())
                .map_err(|e| PipelineError::Inference(e.to_string()))?
                .into();

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PipelineError::Inference(e.to_string()))?;

        // Classifier exports usually carry a label output next to the
        // probability output; pick the f32 tensor matching the class count
        for output in outputs.iter() {
            if let Ok(view) = output.to_array_view::<f32>() {
                if view.len() == self.num_classes {
                    return Ok(view.iter().copied().collect());
                }
            }
        }

        Err(PipelineError::Inference(format!(
            "model produced no probability output of width {}",
            self.num_classes
        )))
    }
}
