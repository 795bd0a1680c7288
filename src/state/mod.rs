//! State module
//!
//! Immutable parameter snapshots and the document boundary that produces
//! them from host-supplied JSON.

pub mod document;
pub mod params;

pub use document::{RawValue, StateDocument};
pub use params::{ParameterState, StageParams};
