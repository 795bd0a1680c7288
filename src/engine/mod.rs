//! Engine module
//!
//! The composition root and its parts: lifecycle state machine, the two
//! cross-thread handoffs, the signal chain, the callback-side processor,
//! and the device binding.

pub mod chain;
pub mod channels;
pub mod device;
pub mod lifecycle;
pub mod meters;
pub mod processor;

pub use chain::SignalChain;
pub use channels::{state_channel, StatePublisher, StateReceiver};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use meters::{meter_channel, MeterPublisher, MeterReader, MeterSnapshot, MAX_METER_CHANNELS};
pub use processor::{BlockProcessor, MAX_BLOCK_FRAMES};

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::dsp::StageRegistry;
use crate::error::EngineError;
use crate::stages::default_registry;
use crate::state::{ParameterState, StateDocument};

/// Maximum channels a session may have.
pub const MAX_CHANNELS: usize = MAX_METER_CHANNELS;

/// How long `start` waits for the device thread to confirm the stream.
const START_TIMEOUT: Duration = Duration::from_secs(5);

/// Sample rate and channel count for one session.
///
/// Fixed for the lifetime of a `start`..`stop` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionFormat {
    /// Sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Number of channels, 1 to [`MAX_CHANNELS`].
    pub channel_count: usize,
}

impl SessionFormat {
    /// Creates a session format. Call [`validate`](Self::validate) before
    /// using it to start a session.
    pub fn new(sample_rate_hz: u32, channel_count: usize) -> Self {
        Self {
            sample_rate_hz,
            channel_count,
        }
    }

    /// Checks the format against the engine's limits.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sample_rate_hz == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "sample rate must be positive".to_string(),
            });
        }
        if self.channel_count == 0 || self.channel_count > MAX_CHANNELS {
            return Err(EngineError::InvalidConfig {
                reason: format!(
                    "channel count {} out of range 1..={}",
                    self.channel_count, MAX_CHANNELS
                ),
            });
        }
        Ok(())
    }
}

/// The control-thread half of a live session.
struct Session {
    format: SessionFormat,
    publisher: StatePublisher,
    meters: MeterReader,
    stop_tx: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

/// Control-side state behind the engine's mutex.
struct EngineInner {
    registry: StageRegistry,
    session: Option<Session>,
    current_state: Option<Arc<ParameterState>>,
}

/// The engine: owns the session and exposes the four control operations.
///
/// All four operations are individually thread-safe; concurrent callers
/// are serialized by an internal mutex. The audio callback runs on the
/// device's own thread and never touches that mutex; it communicates
/// only through the wait-free handoffs.
pub struct Engine {
    inner: Mutex<EngineInner>,
    lifecycle: Arc<Lifecycle>,
}

impl Engine {
    /// Creates an engine with the built-in stage set.
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    /// Creates an engine with a custom stage registry.
    ///
    /// The registry's registration order is the chain order of every
    /// session this engine starts.
    pub fn with_registry(registry: StageRegistry) -> Self {
        Self {
            inner: Mutex::new(EngineInner {
                registry,
                session: None,
                current_state: None,
            }),
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Starts a session with the given format.
    ///
    /// Fails with `InvalidConfig` before touching any device, with
    /// `AlreadyRunning` if a session is live (the live session is left
    /// untouched), with `DeviceFailure` if a failed session has not been
    /// stopped yet, and with `DeviceUnavailable` if the device cannot be
    /// acquired, in which case the engine is back in `Idle`, not
    /// half-started. The wait for the device is bounded.
    pub fn start(&self, format: SessionFormat) -> Result<(), EngineError> {
        format.validate()?;

        let mut inner = self.lock();

        if self.lifecycle.state() == LifecycleState::Error {
            return Err(EngineError::DeviceFailure);
        }
        if !self.lifecycle.begin_start() {
            return Err(EngineError::AlreadyRunning);
        }

        let chain = SignalChain::from_registry(&inner.registry);
        let (publisher, receiver) = state_channel();
        let (meter_tx, meter_rx) = meter_channel(format.channel_count);
        let processor = BlockProcessor::new(chain, format, receiver, meter_tx);

        let (ack_tx, ack_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel();
        let lifecycle = Arc::clone(&self.lifecycle);

        let thread = match thread::Builder::new()
            .name("dsp-engine-session".to_string())
            .spawn(move || device::run_session(format, processor, lifecycle, ack_tx, stop_rx))
        {
            Ok(handle) => handle,
            Err(e) => {
                self.lifecycle.abort_start();
                return Err(EngineError::DeviceUnavailable(format!(
                    "failed to spawn session thread: {e}"
                )));
            }
        };

        match ack_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(())) => {
                self.lifecycle.confirm_running();
                inner.session = Some(Session {
                    format,
                    publisher,
                    meters: meter_rx,
                    stop_tx,
                    thread: Some(thread),
                });
                log::info!(
                    "engine running at {} Hz, {} channels",
                    format.sample_rate_hz,
                    format.channel_count
                );
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                self.lifecycle.abort_start();
                log::warn!("start failed: {e}");
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                // Unblock the thread if it ever gets as far as parking.
                drop(stop_tx);
                self.lifecycle.abort_start();
                Err(EngineError::DeviceUnavailable(
                    "timed out waiting for device".to_string(),
                ))
            }
        }
    }

    /// Stops the session.
    ///
    /// Idempotent: stopping an already-stopped engine succeeds. Also the
    /// required way out of the `Error` state after a device failure.
    pub fn stop(&self) -> Result<(), EngineError> {
        let mut inner = self.lock();

        if !self.lifecycle.begin_stop() {
            // Idle already; nothing to tear down.
            return Ok(());
        }

        if let Some(mut session) = inner.session.take() {
            let _ = session.stop_tx.send(());
            if let Some(handle) = session.thread.take() {
                let _ = handle.join();
            }
            // The receiver side is gone with the session thread; drain
            // whatever it retired.
            session.publisher.collect_retired();
        }
        inner.current_state = None;

        self.lifecycle.finish_stop();
        log::info!("engine stopped");
        Ok(())
    }

    /// Applies a parameter document.
    ///
    /// Decodes and validates on the calling thread, then publishes the
    /// snapshot for the audio thread to adopt at its next callback.
    /// Fire-and-forget: rapid calls may overwrite each other and only the
    /// newest snapshot is adopted. A malformed document is rejected whole
    /// and the live state is unchanged. Without a live session the
    /// decoded snapshot is discarded.
    pub fn apply_state(&self, document: &str) -> Result<(), EngineError> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let state = StateDocument::parse(document)?.into_state(&inner.registry)?;
        let state = Arc::new(state);

        match inner.session.as_mut() {
            Some(session) => {
                session.publisher.publish(Arc::clone(&state));
                log::debug!("published parameter state v{}", state.version());
                inner.current_state = Some(state);
            }
            None => {
                log::debug!("no session; parameter state v{} discarded", state.version());
            }
        }
        Ok(())
    }

    /// Reads the latest peak meters.
    ///
    /// Returns exactly `count` values: live channel peaks first, zeros
    /// beyond the session's channel count or when no session is running.
    /// Never fails and never blocks on the audio thread.
    pub fn get_meters(&self, count: usize) -> Vec<f32> {
        let mut out = vec![0.0; count];

        let mut inner = self.lock();
        if let Some(session) = inner.session.as_mut() {
            let snapshot = session.meters.read();
            for (ch, slot) in out.iter_mut().enumerate().take(snapshot.channels) {
                *slot = snapshot.peak(ch);
            }
        }
        out
    }

    /// The current lifecycle state.
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// True while a session is live.
    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// The live session's format, if any.
    pub fn session_format(&self) -> Option<SessionFormat> {
        self.lock().session.as_ref().map(|s| s.format)
    }

    /// The most recently applied parameter state of the live session.
    pub fn current_state(&self) -> Option<Arc<ParameterState>> {
        self.lock().current_state.clone()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Dropping the stop sender unparks the session thread if the host
        // forgot to stop; join so the stream dies before the engine does.
        let mut inner = self.lock();
        if let Some(mut session) = inner.session.take() {
            let _ = session.stop_tx.send(());
            if let Some(handle) = session.thread.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_invalid_config_rejected_before_device() {
        let engine = Engine::new();

        let err = engine.start(SessionFormat::new(0, 2)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));

        let err = engine.start(SessionFormat::new(48000, 0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));

        let err = engine
            .start(SessionFormat::new(48000, MAX_CHANNELS + 1))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));

        assert_eq!(engine.lifecycle_state(), LifecycleState::Idle);
    }

    #[test]
    fn test_stop_while_idle_is_ok() {
        let engine = Engine::new();
        assert!(engine.stop().is_ok());
        assert!(engine.stop().is_ok());
        assert_eq!(engine.lifecycle_state(), LifecycleState::Idle);
    }

    #[test]
    fn test_get_meters_idle_returns_zeros() {
        let engine = Engine::new();
        assert_eq!(engine.get_meters(0), Vec::<f32>::new());
        assert_eq!(engine.get_meters(4), vec![0.0; 4]);
        assert_eq!(engine.get_meters(16), vec![0.0; 16]);
    }

    #[test]
    fn test_apply_state_idle_validates_but_discards() {
        let engine = Engine::new();

        assert!(engine.apply_state(r#"{"gain": {"level_db": -3.0}}"#).is_ok());
        assert!(engine.current_state().is_none());

        let err = engine.apply_state("not json").unwrap_err();
        assert!(matches!(err, EngineError::MalformedState(_)));

        let err = engine.apply_state(r#"{"nope": {}}"#).unwrap_err();
        assert!(matches!(err, EngineError::MalformedState(_)));
    }

    #[test]
    fn test_session_format_validation() {
        assert!(SessionFormat::new(44100, 1).validate().is_ok());
        assert!(SessionFormat::new(192000, MAX_CHANNELS).validate().is_ok());
        assert!(SessionFormat::new(0, 1).validate().is_err());
        assert!(SessionFormat::new(44100, 9).validate().is_err());
    }

    #[test]
    fn test_no_session_metadata_when_idle() {
        let engine = Engine::new();
        assert!(engine.session_format().is_none());
        assert!(!engine.is_running());
    }

    // The tests below need real audio hardware and are skipped by default.

    #[test]
    #[ignore = "requires an audio output device"]
    fn test_start_stop_round_trip() {
        let engine = Engine::new();
        let format = SessionFormat::new(48000, 2);

        engine.start(format).expect("start should succeed");
        assert!(engine.is_running());
        assert_eq!(engine.session_format(), Some(format));

        // A second start must fail and leave the session alone.
        let err = engine.start(format).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyRunning));
        assert!(engine.is_running());

        engine.stop().expect("stop should succeed");
        assert_eq!(engine.lifecycle_state(), LifecycleState::Idle);
        assert!(engine.session_format().is_none());
    }

    #[test]
    #[ignore = "requires an audio output device"]
    fn test_apply_state_round_trip_while_running() {
        let engine = Engine::new();
        engine
            .start(SessionFormat::new(48000, 2))
            .expect("start should succeed");

        engine
            .apply_state(r#"{"gain": {"level_db": -6.0}, "eq": {"low_db": 3.0}}"#)
            .expect("apply should succeed");

        let state = engine.current_state().expect("state should be live");
        assert_eq!(state.parameter("gain", "level_db"), Some(-6.0));
        assert_eq!(state.parameter("eq", "low_db"), Some(3.0));

        // Meters beyond the live channel count are zero-filled.
        let meters = engine.get_meters(4);
        assert_eq!(meters.len(), 4);
        assert_eq!(meters[2], 0.0);
        assert_eq!(meters[3], 0.0);

        engine.stop().expect("stop should succeed");
    }
}
