//! Parameter definitions for DSP stages.
//!
//! Parameters are the controllable values on stages. Definitions carry the
//! valid range and default so the state boundary can validate and clamp
//! incoming documents before anything reaches the audio thread.

/// Definition of a parameter on a DSP stage.
///
/// Each parameter has a unique ID within its stage, a human-readable name,
/// a unit label, a valid range, and a default value.
#[derive(Clone, Debug)]
pub struct ParameterDefinition {
    /// Unique identifier for this parameter within the stage.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Unit label (e.g., "dB", "ms", ""). Informational only.
    pub unit: &'static str,
    /// Minimum value of the parameter.
    pub min: f32,
    /// Maximum value of the parameter.
    pub max: f32,
    /// Default value when a stage is created.
    pub default: f32,
}

impl ParameterDefinition {
    /// Creates a new parameter definition.
    pub fn new(
        id: &'static str,
        name: &'static str,
        unit: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            id,
            name,
            unit,
            min,
            max,
            default,
        }
    }

    /// Creates a gain parameter in decibels.
    pub fn db(id: &'static str, name: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self::new(id, name, "dB", min, max, default)
    }

    /// Creates a time parameter in milliseconds.
    pub fn ms(id: &'static str, name: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self::new(id, name, "ms", min, max, default)
    }

    /// Creates an on/off toggle parameter (0.0 = off, 1.0 = on).
    pub fn toggle(id: &'static str, name: &'static str, default: bool) -> Self {
        Self::new(id, name, "", 0.0, 1.0, if default { 1.0 } else { 0.0 })
    }

    /// Clamps a value to this parameter's valid range.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Normalizes a value from the parameter's range to 0.0-1.0.
    pub fn normalize(&self, value: f32) -> f32 {
        if (self.max - self.min).abs() < f32::EPSILON {
            0.0
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }
}
