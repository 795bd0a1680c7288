//! Decoding of host parameter documents.
//!
//! The host hands the engine a JSON document mapping stage ids to parameter
//! values. Decoding and validation both happen here on the control thread;
//! the audio thread only ever sees fully-typed, range-clamped
//! [`ParameterState`] snapshots. A document that fails any check is
//! rejected whole; the live state is never partially updated.

use std::collections::HashMap;

use serde::Deserialize;

use crate::dsp::StageRegistry;
use crate::error::EngineError;

use super::params::{ParameterState, StageParams};

/// A raw parameter value as it appears in the document.
///
/// Toggles may arrive as JSON booleans; everything else is numeric.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Toggle(bool),
}

impl RawValue {
    /// The value as f32 (true = 1.0, false = 0.0).
    pub fn as_f32(self) -> f32 {
        match self {
            RawValue::Number(v) => v as f32,
            RawValue::Toggle(true) => 1.0,
            RawValue::Toggle(false) => 0.0,
        }
    }
}

/// The host-facing parameter document: stage id -> parameter id -> value.
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct StateDocument {
    stages: HashMap<String, HashMap<String, RawValue>>,
}

impl StateDocument {
    /// Parses a JSON document.
    ///
    /// Fails with [`EngineError::MalformedState`] if the text is not a JSON
    /// object of objects of numbers/booleans.
    pub fn parse(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::MalformedState(e.to_string()))
    }

    /// Validates the document against a registry and builds a snapshot.
    ///
    /// Every stage id must be registered and every parameter id must exist
    /// on its stage; values must be finite. Out-of-range values are clamped
    /// to the parameter's range rather than rejected.
    pub fn into_state(self, registry: &StageRegistry) -> Result<ParameterState, EngineError> {
        let mut stages = HashMap::with_capacity(self.stages.len());

        for (stage_id, params) in self.stages {
            let defs = registry.parameters_of(&stage_id).ok_or_else(|| {
                EngineError::MalformedState(format!("unknown stage '{stage_id}'"))
            })?;

            let mut values = StageParams::with_capacity(params.len());
            for (param_id, raw) in params {
                let def = defs.iter().find(|d| d.id == param_id).ok_or_else(|| {
                    EngineError::MalformedState(format!(
                        "unknown parameter '{stage_id}.{param_id}'"
                    ))
                })?;

                let value = raw.as_f32();
                if !value.is_finite() {
                    return Err(EngineError::MalformedState(format!(
                        "non-finite value for '{stage_id}.{param_id}'"
                    )));
                }
                values.insert(param_id, def.clamp(value));
            }
            stages.insert(stage_id, values);
        }

        Ok(ParameterState::new(stages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::default_registry;

    #[test]
    fn test_decode_valid_document() {
        let registry = default_registry();
        let doc = StateDocument::parse(
            r#"{"gain": {"level_db": -6.0}, "limiter": {"enabled": true, "release_ms": 200}}"#,
        )
        .unwrap();
        let state = doc.into_state(&registry).unwrap();

        assert_eq!(state.parameter("gain", "level_db"), Some(-6.0));
        assert_eq!(state.parameter("limiter", "enabled"), Some(1.0));
        assert_eq!(state.parameter("limiter", "release_ms"), Some(200.0));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = StateDocument::parse("not json").unwrap_err();
        assert!(matches!(err, EngineError::MalformedState(_)));

        let err = StateDocument::parse(r#"{"gain": 3.0}"#).unwrap_err();
        assert!(matches!(err, EngineError::MalformedState(_)));

        let err = StateDocument::parse(r#"{"gain": {"level_db": "loud"}}"#).unwrap_err();
        assert!(matches!(err, EngineError::MalformedState(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_stage() {
        let registry = default_registry();
        let doc = StateDocument::parse(r#"{"flanger": {"depth": 0.5}}"#).unwrap();
        let err = doc.into_state(&registry).unwrap_err();
        assert!(matches!(err, EngineError::MalformedState(msg) if msg.contains("flanger")));
    }

    #[test]
    fn test_decode_rejects_unknown_parameter() {
        let registry = default_registry();
        let doc = StateDocument::parse(r#"{"gain": {"wet": 0.5}}"#).unwrap();
        let err = doc.into_state(&registry).unwrap_err();
        assert!(matches!(err, EngineError::MalformedState(msg) if msg.contains("gain.wet")));
    }

    #[test]
    fn test_decode_clamps_out_of_range() {
        let registry = default_registry();
        let doc = StateDocument::parse(r#"{"gain": {"level_db": 99.0}}"#).unwrap();
        let state = doc.into_state(&registry).unwrap();
        // Gain tops out at +12 dB.
        assert_eq!(state.parameter("gain", "level_db"), Some(12.0));
    }

    #[test]
    fn test_empty_document_is_valid() {
        let registry = default_registry();
        let state = StateDocument::parse("{}").unwrap().into_state(&registry).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let registry = default_registry();
        let json = r#"{"eq": {"low_db": 3.0, "mid_db": -2.5, "high_db": 1.5}}"#;
        let state = StateDocument::parse(json).unwrap().into_state(&registry).unwrap();

        assert_eq!(state.parameter("eq", "low_db"), Some(3.0));
        assert_eq!(state.parameter("eq", "mid_db"), Some(-2.5));
        assert_eq!(state.parameter("eq", "high_db"), Some(1.5));
    }
}
