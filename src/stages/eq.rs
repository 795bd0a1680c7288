//! 3-band equalizer stage.
//!
//! Low shelf, mid peaking, and high shelf bands using biquad filters with
//! RBJ Audio EQ Cookbook formulas. Band frequencies are fixed; the host
//! controls the three gains.

use std::f32::consts::PI;

use crate::dsp::{BlockBuffer, ParameterDefinition, ProcessContext, Stage, StageInfo};

/// Low shelf corner frequency in Hz.
const LOW_FREQ: f32 = 120.0;
/// Mid band center frequency in Hz.
const MID_FREQ: f32 = 1000.0;
/// Mid band Q factor.
const MID_Q: f32 = 0.7;
/// High shelf corner frequency in Hz.
const HIGH_FREQ: f32 = 8000.0;

/// Biquad filter coefficients.
#[derive(Clone, Copy, Default)]
struct BiquadCoeffs {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl BiquadCoeffs {
    /// Low shelf coefficients (RBJ cookbook, shelf slope 1).
    fn low_shelf(freq: f32, gain_db: f32, sample_rate: f32) -> Self {
        let a = 10.0f32.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / 2.0 * 2.0f32.sqrt();
        let sqrt_a = a.sqrt();

        let b0 = a * ((a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha);
        let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0);
        let b2 = a * ((a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha);
        let a0 = (a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha;
        let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0);
        let a2 = (a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// Peaking EQ coefficients (RBJ cookbook).
    fn peaking(freq: f32, gain_db: f32, q: f32, sample_rate: f32) -> Self {
        let a = 10.0f32.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_w0;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha / a;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// High shelf coefficients (RBJ cookbook, shelf slope 1).
    fn high_shelf(freq: f32, gain_db: f32, sample_rate: f32) -> Self {
        let a = 10.0f32.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / 2.0 * 2.0f32.sqrt();
        let sqrt_a = a.sqrt();

        let b0 = a * ((a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha);
        let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0);
        let b2 = a * ((a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha);
        let a0 = (a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha;
        let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_w0);
        let a2 = (a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Biquad filter state (delay line), one per band per channel.
#[derive(Clone, Copy, Default)]
struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, input: f32, coeffs: &BiquadCoeffs) -> f32 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 3-band EQ: low shelf at 120 Hz, mid peak at 1 kHz, high shelf at 8 kHz.
///
/// # Parameters
///
/// - **low_db** (-15 to +15 dB): Low shelf gain.
/// - **mid_db** (-15 to +15 dB): Mid band gain.
/// - **high_db** (-15 to +15 dB): High shelf gain.
///
/// With all gains at zero the stage is a bit-exact pass-through.
pub struct Equalizer {
    /// Stage info.
    info: StageInfo,
    /// Parameter definitions.
    parameters: Vec<ParameterDefinition>,
    /// Sample rate from the last prepare() call.
    sample_rate: f32,
    /// Band gains in dB: low, mid, high.
    gains_db: [f32; 3],
    /// Coefficients per band, shared by all channels.
    coeffs: [BiquadCoeffs; 3],
    /// Filter state per channel per band, sized at prepare().
    states: Vec<[BiquadState; 3]>,
    /// Coefficients need recomputing before the next block.
    coeffs_dirty: bool,
}

impl Default for Equalizer {
    fn default() -> Self {
        Self {
            info: StageInfo::new("eq", "Equalizer", "3-band shelving/peaking EQ"),
            parameters: vec![
                ParameterDefinition::db("low_db", "Low", -15.0, 15.0, 0.0),
                ParameterDefinition::db("mid_db", "Mid", -15.0, 15.0, 0.0),
                ParameterDefinition::db("high_db", "High", -15.0, 15.0, 0.0),
            ],
            sample_rate: 44100.0,
            gains_db: [0.0; 3],
            coeffs: [BiquadCoeffs::default(); 3],
            states: Vec::new(),
            coeffs_dirty: true,
        }
    }
}

impl Equalizer {
    fn update_coefficients(&mut self) {
        self.coeffs[0] = BiquadCoeffs::low_shelf(LOW_FREQ, self.gains_db[0], self.sample_rate);
        self.coeffs[1] = BiquadCoeffs::peaking(MID_FREQ, self.gains_db[1], MID_Q, self.sample_rate);
        self.coeffs[2] = BiquadCoeffs::high_shelf(HIGH_FREQ, self.gains_db[2], self.sample_rate);
        self.coeffs_dirty = false;
    }

    fn is_flat(&self) -> bool {
        self.gains_db.iter().all(|&g| g == 0.0)
    }
}

impl Stage for Equalizer {
    fn info(&self) -> &StageInfo {
        &self.info
    }

    fn parameters(&self) -> &[ParameterDefinition] {
        &self.parameters
    }

    fn prepare(&mut self, sample_rate: f32, channels: usize, _max_frames: usize) {
        self.sample_rate = sample_rate;
        self.states = vec![[BiquadState::default(); 3]; channels];
        self.coeffs_dirty = true;
    }

    fn set_parameter(&mut self, id: &str, value: f32) {
        let band = match id {
            "low_db" => 0,
            "mid_db" => 1,
            "high_db" => 2,
            _ => return,
        };
        if self.gains_db[band] != value {
            self.gains_db[band] = value;
            self.coeffs_dirty = true;
        }
    }

    fn process(&mut self, block: &mut BlockBuffer, _context: &ProcessContext) {
        if self.coeffs_dirty {
            self.update_coefficients();
        }
        if self.is_flat() {
            return;
        }

        let channels = block.channels().min(self.states.len());
        for ch in 0..channels {
            let states = &mut self.states[ch];
            for sample in block.channel_mut(ch) {
                let mut v = *sample;
                v = states[0].process(v, &self.coeffs[0]);
                v = states[1].process(v, &self.coeffs[1]);
                v = states[2].process(v, &self.coeffs[2]);
                *sample = v;
            }
        }
    }

    fn reset(&mut self) {
        for states in &mut self.states {
            for state in states {
                state.reset();
            }
        }
    }
}
