//! dsp_engine
//!
//! A real-time audio DSP engine with a lock-free control surface.
//!
//! The engine runs an ordered chain of DSP stages inside an audio device
//! callback and exposes four thread-safe operations to the host: start a
//! session, stop it, apply a JSON parameter document, and read per-channel
//! peak meters. Parameter updates and meter readings cross between the
//! control thread and the audio thread over wait-free handoffs; the audio
//! callback never locks, allocates, or frees.
//!
//! ```no_run
//! use dsp_engine::engine::{Engine, SessionFormat};
//!
//! let engine = Engine::new();
//! engine.start(SessionFormat::new(48000, 2))?;
//! engine.apply_state(r#"{"gain": {"level_db": -6.0}}"#)?;
//! let peaks = engine.get_meters(2);
//! engine.stop()?;
//! # Ok::<(), dsp_engine::error::EngineError>(())
//! ```

pub mod dsp;
pub mod engine;
pub mod error;
pub mod stages;
pub mod state;
