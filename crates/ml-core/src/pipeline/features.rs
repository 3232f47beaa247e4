//! Feature engineering for battery telemetry readings
//!
//! Applies the same derived-signal computation the model was trained with.
//! Everything here is pure arithmetic over the raw fields; derived values
//! are recomputed on every call and never carried across readings.

use crate::error::PipelineError;
use crate::models::RawReading;
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw numeric fields the derived signals are computed from
pub const REQUIRED_FIELDS: &[&str] = &[
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
];

/// A reading field after type normalization
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Category(String),
}

/// A reading enriched with derived signals, keyed by column name
pub type FeatureSet = BTreeMap<String, FieldValue>;

/// Rewrite boolean fields as 0/1 numbers, in place.
///
/// The training pipeline casts the moisture flag to int before feature
/// engineering; applying the coercion to every boolean keeps arbitrary
/// field sets consistent with that.
pub fn coerce_booleans(reading: &mut RawReading) {
    for value in reading.values_mut() {
        if let Value::Bool(flag) = value {
            *value = Value::from(if *flag { 1 } else { 0 });
        }
    }
}

/// Enrich a raw reading with the seven derived signals.
///
/// Fails if a required field is absent or non-numeric, or if any field
/// carries a value that cannot be encoded (null, array, object).
pub fn engineer_features(reading: &RawReading) -> Result<FeatureSet, PipelineError> {
    let mut features = FeatureSet::new();
    for (name, value) in reading {
        let converted = match value {
            Value::Number(n) => {
                let v = n
                    .as_f64()
                    .ok_or_else(|| PipelineError::NotNumeric(name.clone()))?;
                FieldValue::Number(v)
            }
            Value::String(s) => FieldValue::Category(s.clone()),
            // Booleans are normally coerced upstream; handle stragglers
            Value::Bool(flag) => FieldValue::Number(if *flag { 1.0 } else { 0.0 }),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                return Err(PipelineError::SchemaAlignment {
                    field: name.clone(),
                })
            }
        };
        features.insert(name.clone(), converted);
    }

    let max_temp = numeric(&features, "MaxTemp_C")?;
    let min_temp = numeric(&features, "MinTemp_C")?;
    let ambient_temp = numeric(&features, "AmbientTemp_C")?;
    let pack_voltage = numeric(&features, "PackVoltage_V")?;
    let demand_voltage = numeric(&features, "DemandVoltage_V")?;
    let charge_current = numeric(&features, "ChargeCurrent_A")?;
    let demand_current = numeric(&features, "DemandCurrent_A")?;
    let charge_power = numeric(&features, "ChargePower_kW")?;
    let soc = numeric(&features, "SOC_%")?;
    let health = numeric(&features, "StateOfHealth_%")?;
    let resistance = numeric(&features, "InternalResistance_mOhm")?;
    let vibration = numeric(&features, "VibrationLevel_mg")?;

    features.insert("TempRange".into(), FieldValue::Number(max_temp - min_temp));
    features.insert(
        "TempDelta".into(),
        FieldValue::Number(max_temp - ambient_temp),
    );
    features.insert(
        "VoltageDiff".into(),
        FieldValue::Number((pack_voltage - demand_voltage).abs()),
    );
    features.insert(
        "CurrentDiff".into(),
        FieldValue::Number((charge_current - demand_current).abs()),
    );
    // The +1 keeps the ratio defined at SOC = 0
    features.insert(
        "PowerDensity".into(),
        FieldValue::Number(charge_power / (soc + 1.0)),
    );
    features.insert(
        "ThermalRisk".into(),
        FieldValue::Number(max_temp * resistance / 100.0),
    );
    features.insert(
        "HealthRisk".into(),
        FieldValue::Number((100.0 - health) * vibration / 100.0),
    );

    Ok(features)
}

fn numeric(features: &FeatureSet, name: &str) -> Result<f64, PipelineError> {
    match features.get(name) {
        Some(FieldValue::Number(v)) => Ok(*v),
        Some(FieldValue::Category(_)) => Err(PipelineError::NotNumeric(name.to_string())),
        None => Err(PipelineError::MissingField(name.to_string())),
    }
}
