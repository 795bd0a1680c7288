//! Stage registry for managing DSP stage types.
//!
//! The registry is a catalog of available stage types. It caches each
//! stage's parameter definitions so the state boundary can validate
//! documents without instantiating stages, and its registration order
//! defines the signal chain order for a session.

use std::collections::HashMap;

use super::parameter::ParameterDefinition;
use super::stage::{Stage, StageInfo};

/// Factory function type for creating stage instances.
pub type StageFactory = fn() -> Box<dyn Stage>;

fn create_stage<S: Stage + Default>() -> Box<dyn Stage> {
    Box::new(S::default())
}

/// Catalog of stage types, in chain order.
///
/// Registration order matters: [`SignalChain`](crate::engine::SignalChain)
/// instantiates one of every registered stage in that order when a session
/// starts.
pub struct StageRegistry {
    /// Map of stage id to factory function.
    factories: HashMap<&'static str, StageFactory>,
    /// Stage infos, in registration order.
    infos: Vec<StageInfo>,
    /// Parameter definitions cached per stage id.
    parameters: HashMap<&'static str, Vec<ParameterDefinition>>,
}

impl StageRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            infos: Vec::new(),
            parameters: HashMap::new(),
        }
    }

    /// Registers a stage type.
    ///
    /// A temporary instance is created to capture the stage's info and
    /// parameter definitions.
    ///
    /// # Panics
    ///
    /// Panics if a stage with the same id is already registered.
    pub fn register<S: Stage + Default>(&mut self) {
        let temp = S::default();
        let info = temp.info().clone();
        let id = info.id;

        if self.factories.contains_key(id) {
            panic!("Stage '{}' is already registered", id);
        }

        self.parameters.insert(id, temp.parameters().to_vec());
        self.factories.insert(id, create_stage::<S>);
        self.infos.push(info);
    }

    /// Creates a new instance of a stage by its id.
    pub fn create(&self, id: &str) -> Option<Box<dyn Stage>> {
        self.factories.get(id).map(|factory| factory())
    }

    /// Returns the parameter definitions for a stage id, or `None` if the
    /// id is not registered.
    pub fn parameters_of(&self, id: &str) -> Option<&[ParameterDefinition]> {
        self.parameters.get(id).map(|defs| defs.as_slice())
    }

    /// Stage infos in registration (= chain) order.
    pub fn infos(&self) -> &[StageInfo] {
        &self.infos
    }

    /// Checks if a stage with the given id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Number of registered stage types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// True if no stages are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{BlockBuffer, ProcessContext};

    struct NullStage {
        info: StageInfo,
        parameters: Vec<ParameterDefinition>,
    }

    impl Default for NullStage {
        fn default() -> Self {
            Self {
                info: StageInfo::new("null", "Null", "does nothing"),
                parameters: vec![ParameterDefinition::db("level", "Level", -60.0, 12.0, 0.0)],
            }
        }
    }

    impl Stage for NullStage {
        fn info(&self) -> &StageInfo {
            &self.info
        }
        fn parameters(&self) -> &[ParameterDefinition] {
            &self.parameters
        }
        fn prepare(&mut self, _sample_rate: f32, _channels: usize, _max_frames: usize) {}
        fn set_parameter(&mut self, _id: &str, _value: f32) {}
        fn process(&mut self, _block: &mut BlockBuffer, _context: &ProcessContext) {}
        fn reset(&mut self) {}
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = StageRegistry::new();
        registry.register::<NullStage>();

        assert!(registry.contains("null"));
        assert_eq!(registry.len(), 1);

        let stage = registry.create("null");
        assert!(stage.is_some());
        assert_eq!(stage.unwrap().info().id, "null");
    }

    #[test]
    fn test_create_unknown_returns_none() {
        let registry = StageRegistry::new();
        assert!(registry.create("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parameters_cached() {
        let mut registry = StageRegistry::new();
        registry.register::<NullStage>();

        let defs = registry.parameters_of("null").unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].id, "level");
        assert!(registry.parameters_of("missing").is_none());
    }

    #[test]
    fn test_infos_in_registration_order() {
        let mut registry = StageRegistry::new();
        registry.register::<NullStage>();
        let ids: Vec<_> = registry.infos().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["null"]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_registration_panics() {
        let mut registry = StageRegistry::new();
        registry.register::<NullStage>();
        registry.register::<NullStage>();
    }
}
