//! The signal chain.
//!
//! An ordered sequence of stages applied in turn to each block. The order
//! is fixed when the chain is built from the registry; only parameter
//! values change while a session runs.

use crate::dsp::{BlockBuffer, ProcessContext, Stage, StageRegistry};
use crate::state::ParameterState;

/// An ordered sequence of DSP stages.
pub struct SignalChain {
    stages: Vec<Box<dyn Stage>>,
}

impl SignalChain {
    /// Builds a chain from explicit stage instances.
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Builds a chain with one instance of every registered stage, in
    /// registration order.
    pub fn from_registry(registry: &StageRegistry) -> Self {
        let stages = registry
            .infos()
            .iter()
            .filter_map(|info| registry.create(info.id))
            .collect();
        Self { stages }
    }

    /// Prepares every stage for a session.
    pub fn prepare(&mut self, sample_rate: f32, channels: usize, max_frames: usize) {
        for stage in &mut self.stages {
            stage.prepare(sample_rate, channels, max_frames);
            stage.reset();
        }
    }

    /// Fans an adopted snapshot's values out to the stages.
    ///
    /// Runs on the audio thread; the snapshot's values are already
    /// validated and clamped, so this is pure assignment.
    pub fn adopt(&mut self, state: &ParameterState) {
        for stage in &mut self.stages {
            if let Some(params) = state.stage(stage.info().id) {
                for (id, value) in params {
                    stage.set_parameter(id, *value);
                }
            }
        }
    }

    /// Processes one block through every stage in order.
    pub fn process(&mut self, block: &mut BlockBuffer, context: &ProcessContext) {
        for stage in &mut self.stages {
            stage.process(block, context);
        }
    }

    /// Resets every stage's internal memory.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    /// Stage ids in chain order.
    pub fn stage_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|s| s.info().id)
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if the chain has no stages (a pass-through).
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
