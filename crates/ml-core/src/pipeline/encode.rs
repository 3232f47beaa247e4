//! Schema alignment against the frozen training-time column manifest
//!
//! Mirrors the training pipeline's one-hot-then-reindex step: categorical
//! fields expand to `{field}_{value}` indicator columns, then the column set
//! is reindexed against `ModelColumns` in manifest order. Names absent from
//! the current reading fill with zero; computed columns the manifest does
//! not know are dropped.

use super::features::{FeatureSet, FieldValue};
use std::collections::BTreeMap;

/// Expand categoricals and align the result to the model column manifest.
///
/// The output vector's length and ordering are exactly those of `columns`;
/// this ordering is the central compatibility invariant with the fitted
/// scaler and classifier.
pub fn encode_aligned(features: &FeatureSet, columns: &[String]) -> Vec<f64> {
    let expanded = expand_categoricals(features);
    columns
        .iter()
        .map(|name| expanded.get(name).copied().unwrap_or(0.0))
        .collect()
}

/// One-hot expansion on a single reading.
///
/// Only the category value actually present can produce an indicator column;
/// the sibling columns of that category family appear through the reindex
/// zero-fill, never here.
fn expand_categoricals(features: &FeatureSet) -> BTreeMap<String, f64> {
    let mut expanded = BTreeMap::new();
    for (name, value) in features {
        match value {
            FieldValue::Number(v) => {
                expanded.insert(name.clone(), *v);
            }
            FieldValue::Category(category) => {
                expanded.insert(format!("{}_{}", name, category), 1.0);
            }
        }
    }
    expanded
}
