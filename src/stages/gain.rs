//! Gain stage.
//!
//! Scales every channel by a decibel level. The level is smoothed so an
//! adopted parameter change ramps over a few milliseconds instead of
//! stepping, which would click.

use crate::dsp::{
    BlockBuffer, ParameterDefinition, ProcessContext, SmoothedValue, Stage, StageInfo,
};

use super::db_to_linear;

/// A smoothed wide-band gain stage.
///
/// # Parameters
///
/// - **level_db** (-60 to +12 dB): Gain applied to every channel.
pub struct Gain {
    /// Stage info.
    info: StageInfo,
    /// Parameter definitions.
    parameters: Vec<ParameterDefinition>,
    /// Smoothed linear gain. Smoothing in the linear domain keeps the
    /// per-sample cost to one multiply.
    level: SmoothedValue,
}

impl Default for Gain {
    fn default() -> Self {
        Self {
            info: StageInfo::new("gain", "Gain", "Wide-band level control"),
            parameters: vec![ParameterDefinition::db(
                "level_db",
                "Level",
                -60.0,
                12.0,
                0.0,
            )],
            level: SmoothedValue::with_default_smoothing(1.0, 44100.0),
        }
    }
}

impl Stage for Gain {
    fn info(&self) -> &StageInfo {
        &self.info
    }

    fn parameters(&self) -> &[ParameterDefinition] {
        &self.parameters
    }

    fn prepare(&mut self, sample_rate: f32, _channels: usize, _max_frames: usize) {
        self.level.set_sample_rate(sample_rate);
    }

    fn set_parameter(&mut self, id: &str, value: f32) {
        if id == "level_db" {
            self.level.set_target(db_to_linear(value));
        }
    }

    fn process(&mut self, block: &mut BlockBuffer, _context: &ProcessContext) {
        if self.level.is_settled() {
            let gain = self.level.current();
            if (gain - 1.0).abs() < f32::EPSILON {
                return;
            }
            for ch in 0..block.channels() {
                for sample in block.channel_mut(ch) {
                    *sample *= gain;
                }
            }
            return;
        }

        // Mid-ramp: every channel must see the identical gain curve, so the
        // ramp restarts from the same smoother state per channel and the
        // advanced state is kept afterwards.
        let start = self.level.clone();
        let mut advanced = start.clone();
        for ch in 0..block.channels() {
            let mut ramp = start.clone();
            for sample in block.channel_mut(ch) {
                *sample *= ramp.next();
            }
            advanced = ramp;
        }
        self.level = advanced;
    }

    fn reset(&mut self) {
        self.level.snap(self.level.target());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn block_of(channels: usize, frames: usize, value: f32) -> BlockBuffer {
        let mut block = BlockBuffer::new(channels, frames);
        for ch in 0..channels {
            block.channel_mut(ch).fill(value);
        }
        block
    }

    #[test]
    fn test_unity_gain_is_identity() {
        let mut gain = Gain::default();
        gain.prepare(48000.0, 2, 64);

        let mut block = block_of(2, 64, 0.5);
        let ctx = ProcessContext::new(48000.0, 2, 64);
        gain.process(&mut block, &ctx);

        assert!(block.channel(0).iter().all(|&s| s == 0.5));
        assert!(block.channel(1).iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_minus_six_db_halves() {
        let mut gain = Gain::default();
        // Parameter set before prepare: prepare settles the smoother, so
        // the very first block already runs at the target gain.
        gain.set_parameter("level_db", -6.0206);
        gain.prepare(48000.0, 1, 64);

        let mut block = block_of(1, 64, 0.8);
        let ctx = ProcessContext::new(48000.0, 1, 64);
        gain.process(&mut block, &ctx);

        assert_relative_eq!(block.channel(0)[0], 0.4, epsilon = 1.0e-3);
    }

    #[test]
    fn test_gain_ramp_is_identical_across_channels() {
        let mut gain = Gain::default();
        gain.prepare(48000.0, 2, 128);
        gain.set_parameter("level_db", -12.0);

        let mut block = block_of(2, 128, 1.0);
        let ctx = ProcessContext::new(48000.0, 2, 128);
        gain.process(&mut block, &ctx);

        for i in 0..128 {
            assert_eq!(block.channel(0)[i], block.channel(1)[i]);
        }
        // Ramp moves toward the target.
        assert!(block.channel(0)[127] < block.channel(0)[0]);
    }

    #[test]
    fn test_ramp_converges_to_target() {
        let mut gain = Gain::default();
        gain.prepare(48000.0, 1, 256);
        gain.set_parameter("level_db", -6.0206);

        let ctx = ProcessContext::new(48000.0, 1, 256);
        // ~0.5s of audio, far past the 10ms time constant.
        for _ in 0..100 {
            let mut block = block_of(1, 256, 1.0);
            gain.process(&mut block, &ctx);
        }

        let mut block = block_of(1, 256, 1.0);
        gain.process(&mut block, &ctx);
        assert_relative_eq!(block.channel(0)[255], 0.5, epsilon = 1.0e-3);
    }

    #[test]
    fn test_reset_snaps_to_target() {
        let mut gain = Gain::default();
        gain.prepare(48000.0, 1, 64);
        gain.set_parameter("level_db", -60.0);
        gain.reset();

        let mut block = block_of(1, 64, 1.0);
        let ctx = ProcessContext::new(48000.0, 1, 64);
        gain.process(&mut block, &ctx);
        assert_relative_eq!(block.channel(0)[0], 0.001, epsilon = 1.0e-5);
    }
}
