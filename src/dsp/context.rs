//! Processing context for DSP stages.
//!
//! Provides the runtime information stages need during block processing.

/// Context provided to stages during block processing.
///
/// Describes the block currently being processed: the session's sample rate
/// and channel count, and the number of frames in this particular block
/// (which may be smaller than the prepared maximum).
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// The audio sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: f32,
    /// Number of channels in the session.
    pub channels: usize,
    /// Number of frames in the current block.
    pub frames: usize,
}

impl ProcessContext {
    /// Creates a new process context.
    pub fn new(sample_rate: f32, channels: usize, frames: usize) -> Self {
        Self {
            sample_rate,
            channels,
            frames,
        }
    }

    /// Returns the duration of the current block in seconds.
    pub fn block_duration(&self) -> f32 {
        self.frames as f32 / self.sample_rate
    }

    /// Returns the Nyquist frequency (half the sample rate).
    pub fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }
}
