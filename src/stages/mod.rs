//! Stages module
//!
//! Built-in DSP stages: gain, 3-band EQ, and peak limiter. The default
//! registry lists them in signal-chain order.

pub mod eq;
pub mod gain;
pub mod limiter;

pub use eq::Equalizer;
pub use gain::Gain;
pub use limiter::Limiter;

use crate::dsp::StageRegistry;

/// Converts a decibel value to linear amplitude.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Creates the registry of built-in stages.
///
/// Registration order is chain order: gain, then EQ, then the limiter on
/// the end of the chain.
pub fn default_registry() -> StageRegistry {
    let mut registry = StageRegistry::new();
    registry.register::<Gain>();
    registry.register::<Equalizer>();
    registry.register::<Limiter>();
    registry
}
