//! Pre-allocated audio block buffer.
//!
//! The engine processes planar (channel-major) blocks while the device
//! callback hands over interleaved samples. `BlockBuffer` owns one
//! pre-allocated planar scratch area and converts between the two layouts,
//! so no allocation ever happens inside the audio callback.

/// A planar audio block with a fixed pre-allocated capacity.
///
/// Samples are stored channel-major: all of channel 0, then all of
/// channel 1, and so on. The number of valid frames per channel varies
/// block to block but never exceeds the capacity chosen at construction.
pub struct BlockBuffer {
    /// Channel-major sample storage, `channels * capacity` long.
    samples: Vec<f32>,
    /// Number of channels.
    channels: usize,
    /// Maximum frames per channel.
    capacity: usize,
    /// Valid frames per channel in the current block.
    frames: usize,
}

impl BlockBuffer {
    /// Creates a new block buffer, zero-filled.
    pub fn new(channels: usize, max_frames: usize) -> Self {
        Self {
            samples: vec![0.0; channels * max_frames],
            channels,
            capacity: max_frames,
            frames: max_frames,
        }
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Valid frames per channel in the current block.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Maximum frames per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sets the number of valid frames, capped at the capacity.
    pub fn set_frames(&mut self, frames: usize) {
        self.frames = frames.min(self.capacity);
    }

    /// Returns the current block's samples for one channel.
    pub fn channel(&self, ch: usize) -> &[f32] {
        let start = ch * self.capacity;
        &self.samples[start..start + self.frames]
    }

    /// Returns the current block's samples for one channel, mutably.
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        let start = ch * self.capacity;
        &mut self.samples[start..start + self.frames]
    }

    /// Sets all samples to zero.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Peak absolute sample value in one channel of the current block.
    ///
    /// Returns 0.0 for an empty block. Never negative; NaN inputs are
    /// ignored by the max fold.
    pub fn peak(&self, ch: usize) -> f32 {
        self.channel(ch).iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    /// Fills the block from an interleaved buffer.
    ///
    /// The frame count becomes `interleaved.len() / channels`, capped at
    /// the capacity. Extra interleaved frames beyond the capacity are left
    /// for the caller to feed through a subsequent block.
    pub fn deinterleave_from(&mut self, interleaved: &[f32]) {
        let frames = (interleaved.len() / self.channels).min(self.capacity);
        self.frames = frames;
        for ch in 0..self.channels {
            let base = ch * self.capacity;
            for i in 0..frames {
                self.samples[base + i] = interleaved[i * self.channels + ch];
            }
        }
    }

    /// Writes the current block back into an interleaved buffer.
    pub fn interleave_into(&self, interleaved: &mut [f32]) {
        for ch in 0..self.channels {
            let base = ch * self.capacity;
            for i in 0..self.frames {
                interleaved[i * self.channels + ch] = self.samples[base + i];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buf = BlockBuffer::new(2, 256);
        assert_eq!(buf.channels(), 2);
        assert_eq!(buf.capacity(), 256);
        assert_eq!(buf.frames(), 256);
        assert!(buf.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_set_frames_caps_at_capacity() {
        let mut buf = BlockBuffer::new(2, 64);
        buf.set_frames(32);
        assert_eq!(buf.frames(), 32);
        assert_eq!(buf.channel(1).len(), 32);

        buf.set_frames(1000);
        assert_eq!(buf.frames(), 64);
    }

    #[test]
    fn test_deinterleave_interleave_round_trip() {
        let mut buf = BlockBuffer::new(2, 8);
        // 4 stereo frames: L = 0.1, 0.2, ..., R = -0.1, -0.2, ...
        let interleaved = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3, 0.4, -0.4];
        buf.deinterleave_from(&interleaved);

        assert_eq!(buf.frames(), 4);
        assert_eq!(buf.channel(0), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(buf.channel(1), &[-0.1, -0.2, -0.3, -0.4]);

        let mut out = [0.0; 8];
        buf.interleave_into(&mut out);
        assert_eq!(out, interleaved);
    }

    #[test]
    fn test_deinterleave_caps_at_capacity() {
        let mut buf = BlockBuffer::new(1, 4);
        let interleaved = [1.0; 10];
        buf.deinterleave_from(&interleaved);
        assert_eq!(buf.frames(), 4);
    }

    #[test]
    fn test_peak() {
        let mut buf = BlockBuffer::new(2, 4);
        buf.deinterleave_from(&[0.5, -0.9, -0.2, 0.1, 0.3, 0.0, 0.0, 0.4]);
        assert_eq!(buf.peak(0), 0.5);
        assert_eq!(buf.peak(1), 0.9);
    }

    #[test]
    fn test_peak_of_silence_is_zero() {
        let buf = BlockBuffer::new(1, 16);
        assert_eq!(buf.peak(0), 0.0);
    }

    #[test]
    fn test_clear() {
        let mut buf = BlockBuffer::new(1, 4);
        buf.channel_mut(0).fill(0.7);
        buf.clear();
        assert!(buf.channel(0).iter().all(|&s| s == 0.0));
    }
}
