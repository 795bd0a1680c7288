//! Audio device binding.
//!
//! Wraps cpal device acquisition and the output stream. The stream object
//! is not `Send`, so each session runs a dedicated thread that opens the
//! device, keeps the stream alive, and tears it down on request; the
//! engine talks to that thread through channels and stays usable from any
//! thread.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig};

use crate::error::EngineError;

use super::lifecycle::Lifecycle;
use super::processor::BlockProcessor;
use super::SessionFormat;

/// An acquired output device plus the stream config for one session.
pub struct OutputDevice {
    device: cpal::Device,
    config: StreamConfig,
}

impl OutputDevice {
    /// Acquires the default output device for the session format.
    ///
    /// The exact format is requested from the device; no silent
    /// renegotiation. A host without a default output device, or one that
    /// rejects the format later at stream build, fails the start.
    pub fn open(format: SessionFormat) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::DeviceUnavailable("no default output device".into()))?;

        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        log::info!(
            "using output device '{}' at {} Hz, {} channels",
            name,
            format.sample_rate_hz,
            format.channel_count
        );

        let config = StreamConfig {
            channels: format.channel_count as u16,
            sample_rate: SampleRate(format.sample_rate_hz),
            buffer_size: BufferSize::Default,
        };

        Ok(Self { device, config })
    }

    /// Builds and starts the output stream around a processor.
    ///
    /// The processor is moved into the data callback; the error callback
    /// only flags the lifecycle, which the control thread observes.
    pub fn start_stream(
        &self,
        mut processor: BlockProcessor,
        lifecycle: Arc<Lifecycle>,
    ) -> Result<Stream, EngineError> {
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // The device owns no source; the block starts silent
                    // and the chain transforms it in place.
                    for sample in data.iter_mut() {
                        *sample = 0.0;
                    }
                    processor.process(data);
                },
                move |err| {
                    log::error!("audio stream error: {err}");
                    lifecycle.flag_failure();
                },
                None,
            )
            .map_err(|e| EngineError::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| EngineError::DeviceUnavailable(e.to_string()))?;

        Ok(stream)
    }
}

/// Body of the per-session device thread.
///
/// Opens the device, starts the stream, acknowledges the outcome to
/// `start`, then parks until `stop` signals (or the engine is dropped,
/// which closes the channel). The stream, and with it the processor and
/// its adopted snapshot, is dropped here on this thread.
pub(crate) fn run_session(
    format: SessionFormat,
    processor: BlockProcessor,
    lifecycle: Arc<Lifecycle>,
    ack: Sender<Result<(), EngineError>>,
    stop: Receiver<()>,
) {
    let device = match OutputDevice::open(format) {
        Ok(device) => device,
        Err(e) => {
            let _ = ack.send(Err(e));
            return;
        }
    };

    let stream = match device.start_stream(processor, lifecycle) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ack.send(Err(e));
            return;
        }
    };

    let _ = ack.send(Ok(()));

    // Parked until stop() or engine drop. The callback keeps running on
    // the device's real-time thread meanwhile.
    let _ = stop.recv();

    if let Err(e) = stream.pause() {
        log::warn!("failed to pause stream during stop: {e}");
    }
    drop(stream);
    log::debug!("session thread exited");
}
