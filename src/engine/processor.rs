//! Block processor for the audio callback.
//!
//! This struct is moved into the device callback and is the entire
//! audio-thread side of the engine: it polls for parameter snapshots,
//! runs the signal chain, and publishes per-block peaks. Every step is
//! allocation-free and never blocks.

use crate::dsp::{BlockBuffer, ProcessContext};

use super::chain::SignalChain;
use super::channels::StateReceiver;
use super::meters::{MeterPublisher, MAX_METER_CHANNELS};
use super::SessionFormat;

/// Largest block processed in one pass. Device callbacks bigger than this
/// are processed in sub-blocks rather than reallocating the scratch
/// buffer inside the callback.
pub const MAX_BLOCK_FRAMES: usize = 8192;

/// The audio-callback side of a session.
pub struct BlockProcessor {
    /// The signal chain, prepared for this session's format.
    chain: SignalChain,
    /// Incoming parameter snapshots from the control thread.
    states: StateReceiver,
    /// Outgoing per-block peaks to the control thread.
    meters: MeterPublisher,
    /// Planar scratch for the current block.
    scratch: BlockBuffer,
    /// Peaks for the current block.
    peaks: [f32; MAX_METER_CHANNELS],
    /// Session sample rate.
    sample_rate: f32,
    /// Session channel count.
    channels: usize,
}

impl BlockProcessor {
    /// Creates a processor for one session.
    ///
    /// Prepares the chain and pre-allocates the scratch block; after this,
    /// processing never allocates.
    pub fn new(
        mut chain: SignalChain,
        format: SessionFormat,
        states: StateReceiver,
        meters: MeterPublisher,
    ) -> Self {
        let channels = format.channel_count;
        chain.prepare(format.sample_rate_hz as f32, channels, MAX_BLOCK_FRAMES);

        Self {
            chain,
            states,
            meters,
            scratch: BlockBuffer::new(channels, MAX_BLOCK_FRAMES),
            peaks: [0.0; MAX_METER_CHANNELS],
            sample_rate: format.sample_rate_hz as f32,
            channels,
        }
    }

    /// Processes one device callback's worth of interleaved audio in place.
    ///
    /// Adopts the newest parameter snapshot first, so a snapshot published
    /// before this callback affects the whole callback.
    pub fn process(&mut self, interleaved: &mut [f32]) {
        if let Some(state) = self.states.poll() {
            self.chain.adopt(state);
        }

        let samples_per_block = self.channels * MAX_BLOCK_FRAMES;
        let mut offset = 0;
        while offset < interleaved.len() {
            let end = (offset + samples_per_block).min(interleaved.len());
            self.process_block(&mut interleaved[offset..end]);
            offset = end;
        }
    }

    fn process_block(&mut self, interleaved: &mut [f32]) {
        self.scratch.deinterleave_from(interleaved);

        let context = ProcessContext::new(self.sample_rate, self.channels, self.scratch.frames());
        self.chain.process(&mut self.scratch, &context);

        for ch in 0..self.channels.min(MAX_METER_CHANNELS) {
            self.peaks[ch] = self.scratch.peak(ch);
        }
        self.meters.publish(&self.peaks[..self.channels.min(MAX_METER_CHANNELS)]);

        self.scratch.interleave_into(interleaved);
    }
}
