//! DSP module
//!
//! Core DSP traits and types: the stage contract, parameter definitions,
//! block buffers, and parameter smoothing.

pub mod buffer;
pub mod context;
pub mod parameter;
pub mod registry;
pub mod smoothing;
pub mod stage;

pub use buffer::BlockBuffer;
pub use context::ProcessContext;
pub use parameter::ParameterDefinition;
pub use registry::{StageFactory, StageRegistry};
pub use smoothing::SmoothedValue;
pub use stage::{Stage, StageInfo};
