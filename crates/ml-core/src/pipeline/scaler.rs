//! Pre-fit robust scaler applied ahead of classification
//!
//! The artifact records the per-column center and scale from training,
//! plus the column list it was fitted against so the loader can verify the
//! manifest by name and order, not just width.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// A fitted robust scaling transform: `(x - center) / scale` per column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustScaler {
    /// Column names this transform was fitted against, in fit order
    pub columns: Vec<String>,
    pub center: Vec<f64>,
    pub scale: Vec<f64>,
}

impl RobustScaler {
    /// Input width the transform expects
    pub fn width(&self) -> usize {
        self.center.len()
    }

    /// Replace zero scale entries with 1.0 so constant columns pass through
    /// unscaled instead of dividing by zero. Training-side scalers do the
    /// same at fit time; this covers hand-edited artifacts.
    pub fn normalize_zero_scales(&mut self) {
        for s in &mut self.scale {
            if *s == 0.0 {
                *s = 1.0;
            }
        }
    }

    /// Apply the transform to one aligned feature vector.
    ///
    /// A width disagreement means artifact corruption or version skew and
    /// is fatal to the request.
    pub fn transform(&self, vector: &[f64]) -> Result<Vec<f32>, PipelineError> {
        if vector.len() != self.width() {
            return Err(PipelineError::ArtifactMismatch {
                expected: self.width(),
                got: vector.len(),
            });
        }
        Ok(vector
            .iter()
            .zip(self.center.iter().zip(self.scale.iter()))
            .map(|(v, (c, s))| ((v - c) / s) as f32)
            .collect())
    }
}
