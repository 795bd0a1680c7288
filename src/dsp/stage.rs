//! The core Stage trait and supporting types.
//!
//! A stage is one unit of signal transformation in the chain. Stages are
//! constructed on the control thread, then moved onto the audio thread for
//! the lifetime of a session; everything they do per block must be
//! allocation-free and non-blocking.

use super::buffer::BlockBuffer;
use super::context::ProcessContext;
use super::parameter::ParameterDefinition;

/// Static information about a stage type.
#[derive(Clone, Debug)]
pub struct StageInfo {
    /// Unique identifier for the stage type (e.g., "gain", "eq").
    /// Parameter documents address stages by this id.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// A brief description of what the stage does.
    pub description: &'static str,
}

impl StageInfo {
    /// Creates a new stage info.
    pub fn new(id: &'static str, name: &'static str, description: &'static str) -> Self {
        Self {
            id,
            name,
            description,
        }
    }
}

/// The trait all DSP stages implement.
///
/// # Thread Safety
///
/// `Stage` requires `Send + 'static` because stages are built on the
/// control thread and moved into the audio callback.
///
/// # Real-time Constraints
///
/// `set_parameter`, `process`, and `reset` run on the audio thread and must
/// not allocate, lock, or block. `prepare` runs on the control thread
/// before the session starts and is the only place a stage may allocate.
pub trait Stage: Send + 'static {
    /// Returns static information about this stage.
    fn info(&self) -> &StageInfo;

    /// Returns the parameter definitions for this stage.
    ///
    /// The state boundary uses these to validate and clamp incoming
    /// parameter documents.
    fn parameters(&self) -> &[ParameterDefinition];

    /// Prepares the stage for processing.
    ///
    /// Called before the session starts and never again while it runs.
    /// Stages size their per-channel memory here and precompute anything
    /// that depends on the sample rate.
    fn prepare(&mut self, sample_rate: f32, channels: usize, max_frames: usize);

    /// Sets one parameter to a new value.
    ///
    /// Called on the audio thread when a new parameter snapshot is adopted,
    /// once per parameter present in the snapshot. Values arrive already
    /// clamped to the definition's range. Unknown ids are ignored.
    fn set_parameter(&mut self, id: &str, value: f32);

    /// Processes one block in place.
    ///
    /// Must be safe to call on every block, across any sequence of
    /// parameter changes, without an explicit reset.
    fn process(&mut self, block: &mut BlockBuffer, context: &ProcessContext);

    /// Resets the stage's internal memory (filter history, envelopes).
    ///
    /// Called for discontinuous changes such as a new session format.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal stage that passes audio through unchanged.
    struct Passthrough {
        info: StageInfo,
    }

    impl Default for Passthrough {
        fn default() -> Self {
            Self {
                info: StageInfo::new("pass", "Passthrough", "passes audio through unchanged"),
            }
        }
    }

    impl Stage for Passthrough {
        fn info(&self) -> &StageInfo {
            &self.info
        }

        fn parameters(&self) -> &[ParameterDefinition] {
            &[]
        }

        fn prepare(&mut self, _sample_rate: f32, _channels: usize, _max_frames: usize) {}

        fn set_parameter(&mut self, _id: &str, _value: f32) {}

        fn process(&mut self, _block: &mut BlockBuffer, _context: &ProcessContext) {}

        fn reset(&mut self) {}
    }

    #[test]
    fn test_stage_is_object_safe() {
        let mut stage = Passthrough::default();
        stage.prepare(48000.0, 2, 256);
        let boxed: Box<dyn Stage> = Box::new(stage);
        assert_eq!(boxed.info().id, "pass");
    }

    #[test]
    fn test_stage_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Box<dyn Stage>>();
    }
}
