//! Model artifact bundle: load once at startup, share read-only forever
//!
//! The bundle directory carries the classifier exported to ONNX plus JSON
//! sidecars for the scaler, the frozen column manifest, the ordered class
//! labels, and optional training metadata. An optional checksum manifest is
//! verified before anything is parsed.

use crate::error::ArtifactError;
use crate::models::ModelMetadata;
use crate::pipeline::{Classifier, OnnxClassifier, RobustScaler};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Artifact file names within the bundle directory
pub mod files {
    pub const MODEL: &str = "model.onnx";
    pub const SCALER: &str = "scaler.json";
    pub const COLUMNS: &str = "columns.json";
    pub const LABELS: &str = "labels.json";
    pub const METADATA: &str = "metadata.json";
    pub const MANIFEST: &str = "manifest.json";
}

/// Immutable, versioned model artifact bundle.
///
/// Constructed once at process start and shared behind an `Arc`; never
/// mutated afterwards, so concurrent inference calls need no locking.
#[derive(Debug)]
pub struct ModelArtifacts {
    /// Frozen training-time column manifest; vector order is authoritative
    pub columns: Vec<String>,
    /// Class labels in label-encoder order; index decodes a class
    pub labels: Vec<String>,
    pub scaler: RobustScaler,
    pub classifier: Box<dyn Classifier>,
    pub metadata: ModelMetadata,
    pub loaded_at: i64,
}

#[derive(Debug, Deserialize)]
struct ChecksumManifest {
    files: BTreeMap<String, String>,
}

impl ModelArtifacts {
    /// Load the full bundle from a directory.
    ///
    /// Fatal if the classifier, scaler, columns, or labels cannot be loaded
    /// or disagree with each other; a missing or unreadable metadata
    /// artifact is the single non-fatal exception and falls back to
    /// defaults.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        verify_manifest(dir)?;

        let columns: Vec<String> = read_json(dir, files::COLUMNS)?;
        let labels: Vec<String> = read_json(dir, files::LABELS)?;
        let scaler: RobustScaler = read_json(dir, files::SCALER)?;

        let model_bytes = read_bytes(dir, files::MODEL)?;
        let classifier = OnnxClassifier::from_bytes(&model_bytes, columns.len(), labels.len())?;

        let metadata = load_metadata(dir);

        let artifacts =
            Self::assemble(columns, labels, scaler, Box::new(classifier), metadata)?;
        info!(
            n_columns = artifacts.columns.len(),
            n_classes = artifacts.labels.len(),
            model_type = %artifacts.metadata.model_type,
            accuracy = artifacts.metadata.accuracy,
            "Model artifacts loaded"
        );
        Ok(artifacts)
    }

    /// Assemble a bundle from already-loaded parts, enforcing the
    /// cross-artifact invariants. Also the seam tests use to wire in a stub
    /// classifier.
    pub fn assemble(
        columns: Vec<String>,
        labels: Vec<String>,
        mut scaler: RobustScaler,
        classifier: Box<dyn Classifier>,
        metadata: ModelMetadata,
    ) -> Result<Self, ArtifactError> {
        if columns.is_empty() {
            return Err(ArtifactError::Inconsistent(
                "column manifest is empty".to_string(),
            ));
        }
        if labels.is_empty() {
            return Err(ArtifactError::Inconsistent(
                "label list is empty".to_string(),
            ));
        }
        if scaler.center.len() != scaler.scale.len()
            || scaler.center.len() != scaler.columns.len()
        {
            return Err(ArtifactError::Inconsistent(format!(
                "scaler artifact is malformed: {} columns, {} centers, {} scales",
                scaler.columns.len(),
                scaler.center.len(),
                scaler.scale.len()
            )));
        }
        // A width check alone would miss a transposition of two same-type
        // columns, which silently corrupts every prediction. Require the
        // scaler's recorded columns to match the manifest by name and order.
        if scaler.columns != columns {
            let detail = scaler
                .columns
                .iter()
                .zip(columns.iter())
                .enumerate()
                .find(|(_, (a, b))| a != b)
                .map(|(i, (a, b))| format!("first divergence at index {}: '{}' vs '{}'", i, a, b))
                .unwrap_or_else(|| {
                    format!(
                        "scaler has {} columns, manifest has {}",
                        scaler.columns.len(),
                        columns.len()
                    )
                });
            return Err(ArtifactError::Inconsistent(format!(
                "scaler was fitted against different columns than the manifest ({})",
                detail
            )));
        }
        if classifier.num_features() != columns.len() {
            return Err(ArtifactError::Inconsistent(format!(
                "classifier expects {} features, manifest has {} columns",
                classifier.num_features(),
                columns.len()
            )));
        }
        if classifier.num_classes() != labels.len() {
            return Err(ArtifactError::Inconsistent(format!(
                "classifier emits {} classes, label list has {}",
                classifier.num_classes(),
                labels.len()
            )));
        }

        scaler.normalize_zero_scales();

        Ok(Self {
            columns,
            labels,
            scaler,
            classifier,
            metadata,
            loaded_at: chrono::Utc::now().timestamp(),
        })
    }
}

/// Load training metadata, falling back to defaults on any failure.
pub fn load_metadata(dir: &Path) -> ModelMetadata {
    match fs::read(dir.join(files::METADATA)) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(error = %e, "Metadata artifact unreadable, using defaults");
                ModelMetadata::default()
            }
        },
        Err(_) => {
            warn!("No metadata artifact found, using defaults");
            ModelMetadata::default()
        }
    }
}

/// Verify sha256 checksums for every file the manifest lists.
///
/// The manifest itself is optional; when present, a mismatch is fatal
/// before any artifact is parsed.
fn verify_manifest(dir: &Path) -> Result<(), ArtifactError> {
    let manifest_path = dir.join(files::MANIFEST);
    if !manifest_path.exists() {
        return Ok(());
    }

    let manifest: ChecksumManifest = read_json(dir, files::MANIFEST)?;
    for (name, expected) in &manifest.files {
        let bytes = read_bytes(dir, name)?;
        let actual = compute_checksum(&bytes);
        if &actual != expected {
            return Err(ArtifactError::Checksum {
                name: name.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }
    Ok(())
}

fn read_bytes(dir: &Path, name: &str) -> Result<Vec<u8>, ArtifactError> {
    fs::read(dir.join(name)).map_err(|source| ArtifactError::Io {
        name: name.to_string(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, name: &str) -> Result<T, ArtifactError> {
    let bytes = read_bytes(dir, name)?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        name: name.to_string(),
        source,
    })
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
