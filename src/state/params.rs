//! Immutable parameter state snapshots.
//!
//! A `ParameterState` is a complete snapshot of every stage parameter the
//! host has set, identified by a version number. Updates always replace a
//! whole snapshot; nothing is ever mutated in place, so the audio thread can
//! never observe a half-applied update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-global version counter. Strictly increasing across every
/// snapshot ever constructed, even ones that are never published.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Parameter values for one stage, keyed by parameter id.
pub type StageParams = HashMap<String, f32>;

/// An immutable snapshot of all stage parameters.
#[derive(Clone, Debug)]
pub struct ParameterState {
    /// Stage id -> parameter id -> value.
    stages: HashMap<String, StageParams>,
    /// Version assigned at construction.
    version: u64,
}

impl ParameterState {
    /// Creates a snapshot from already-validated values, assigning the next
    /// global version.
    pub fn new(stages: HashMap<String, StageParams>) -> Self {
        Self {
            stages,
            version: NEXT_VERSION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The snapshot's version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Parameter values for one stage, if the snapshot mentions it.
    pub fn stage(&self, id: &str) -> Option<&StageParams> {
        self.stages.get(id)
    }

    /// One parameter value, if present.
    pub fn parameter(&self, stage_id: &str, param_id: &str) -> Option<f32> {
        self.stages.get(stage_id)?.get(param_id).copied()
    }

    /// Iterates over `(stage id, parameter map)` pairs.
    pub fn stages(&self) -> impl Iterator<Item = (&str, &StageParams)> {
        self.stages.iter().map(|(id, params)| (id.as_str(), params))
    }

    /// Number of stages mentioned by the snapshot.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if the snapshot mentions no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
