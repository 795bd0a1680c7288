//! Limiter stage.
//!
//! A peak limiter with an envelope-follower gain computer and a hard
//! ceiling. Keeps the output at or below the threshold regardless of what
//! upstream stages produce.

use crate::dsp::{
    BlockBuffer, ParameterDefinition, ProcessContext, Stage, StageInfo,
};

use super::db_to_linear;

/// Fixed attack time. Short enough that overshoot past the ceiling is
/// caught within a couple of samples; the residue is clamped anyway.
const ATTACK_MS: f32 = 2.0;

fn envelope_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    if time_ms <= 0.0 || sample_rate <= 0.0 {
        return 0.0;
    }
    (-1.0 / (time_ms * 0.001 * sample_rate)).exp()
}

/// A peak limiter.
///
/// # Parameters
///
/// - **threshold_db** (-24 to 0 dB): Ceiling; output never exceeds it.
/// - **release_ms** (10 to 1000 ms): How quickly gain recovers after a peak.
/// - **enabled** (toggle): Bypasses the stage when off.
pub struct Limiter {
    /// Stage info.
    info: StageInfo,
    /// Parameter definitions.
    parameters: Vec<ParameterDefinition>,
    /// Sample rate from the last prepare() call.
    sample_rate: f32,
    /// Linear ceiling derived from threshold_db. Always > 0.
    ceiling: f32,
    /// Attack coefficient for the envelope follower.
    attack_coeff: f32,
    /// Release coefficient for the envelope follower.
    release_coeff: f32,
    /// Release time, kept for sample-rate changes.
    release_ms: f32,
    /// Envelope level per channel, sized at prepare().
    envelopes: Vec<f32>,
    /// Whether the limiter is active.
    enabled: bool,
}

impl Default for Limiter {
    fn default() -> Self {
        let sample_rate = 44100.0;
        let release_ms = 120.0;
        Self {
            info: StageInfo::new("limiter", "Limiter", "Peak limiter with hard ceiling"),
            parameters: vec![
                ParameterDefinition::db("threshold_db", "Threshold", -24.0, 0.0, -1.0),
                ParameterDefinition::ms("release_ms", "Release", 10.0, 1000.0, release_ms),
                ParameterDefinition::toggle("enabled", "Enabled", true),
            ],
            sample_rate,
            ceiling: db_to_linear(-1.0),
            attack_coeff: envelope_coeff(ATTACK_MS, sample_rate),
            release_coeff: envelope_coeff(release_ms, sample_rate),
            release_ms,
            envelopes: Vec::new(),
            enabled: true,
        }
    }
}

impl Stage for Limiter {
    fn info(&self) -> &StageInfo {
        &self.info
    }

    fn parameters(&self) -> &[ParameterDefinition] {
        &self.parameters
    }

    fn prepare(&mut self, sample_rate: f32, channels: usize, _max_frames: usize) {
        self.sample_rate = sample_rate;
        self.attack_coeff = envelope_coeff(ATTACK_MS, sample_rate);
        self.release_coeff = envelope_coeff(self.release_ms, sample_rate);
        self.envelopes = vec![0.0; channels];
    }

    fn set_parameter(&mut self, id: &str, value: f32) {
        match id {
            "threshold_db" => self.ceiling = db_to_linear(value),
            "release_ms" => {
                self.release_ms = value;
                self.release_coeff = envelope_coeff(value, self.sample_rate);
            }
            "enabled" => self.enabled = value >= 0.5,
            _ => {}
        }
    }

    fn process(&mut self, block: &mut BlockBuffer, _context: &ProcessContext) {
        if !self.enabled {
            return;
        }

        let channels = block.channels().min(self.envelopes.len());
        for ch in 0..channels {
            let mut env = self.envelopes[ch];
            for sample in block.channel_mut(ch) {
                let level = sample.abs();
                let coeff = if level > env {
                    self.attack_coeff
                } else {
                    self.release_coeff
                };
                env = coeff * env + (1.0 - coeff) * level;

                if env > self.ceiling {
                    *sample *= self.ceiling / env;
                }
                // The envelope lags the signal during attack; the residue
                // must not pass the ceiling.
                *sample = sample.clamp(-self.ceiling, self.ceiling);
            }
            self.envelopes[ch] = env;
        }
    }

    fn reset(&mut self) {
        self.envelopes.fill(0.0);
    }
}
