//! Registry mapping configuration class paths to factories

use super::components::ComponentArgs;
use crate::error::{Error, Result};
use crate::models::PixelStats;
use crate::module::{AnomalyModel, AnomalyModule, ModulePipeline};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Object produced by a registered factory.
pub enum Instance {
    /// An anomaly module
    Module(Box<dyn AnomalyModule>),
    /// Anything else a class path may name
    Other {
        /// Type name reported when the object is rejected
        type_name: String,
    },
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module(module) => f.debug_tuple("Module").field(&module.name()).finish(),
            Self::Other { type_name } => f
                .debug_struct("Other")
                .field("type_name", type_name)
                .finish(),
        }
    }
}

/// Factory receiving the model `init_args` (without slot keys) and the slots.
pub type Factory = Box<dyn Fn(&Value, ComponentArgs) -> Result<Instance> + Send + Sync>;

/// Class path to factory table.
#[derive(Default)]
pub struct ModelRegistry {
    factories: BTreeMap<String, Factory>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("class_paths", &self.class_paths())
            .finish()
    }
}

impl ModelRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the models shipped by this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("PixelStats", PixelStats::from_init_args);
        registry
    }

    /// Register a model constructor under `class_path`.
    ///
    /// The factory wraps the model in a [`ModulePipeline`] configured with the
    /// slot arguments found in the configuration.
    pub fn register<M, F>(&mut self, class_path: impl Into<String>, constructor: F)
    where
        M: AnomalyModel,
        F: Fn(&Value) -> Result<M> + Send + Sync + 'static,
    {
        self.register_factory(class_path, move |init_args, components| {
            let model = constructor(init_args)?;
            let pipeline = components.apply(ModulePipeline::builder(model)).build()?;
            Ok(Instance::Module(Box::new(pipeline)))
        });
    }

    /// Register an arbitrary factory.
    pub fn register_factory<F>(&mut self, class_path: impl Into<String>, factory: F)
    where
        F: Fn(&Value, ComponentArgs) -> Result<Instance> + Send + Sync + 'static,
    {
        let class_path = class_path.into();
        let previous = self.factories.insert(class_path.clone(), Box::new(factory));
        if previous.is_some() {
            tracing::warn!(class_path = %class_path, "replacing registered factory");
        }
    }

    /// Registered class paths, sorted
    pub fn class_paths(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn contains(&self, class_path: &str) -> bool {
        self.factories.contains_key(class_path)
    }

    /// Run the factory registered for `class_path`.
    pub fn instantiate(
        &self,
        class_path: &str,
        init_args: &Value,
        components: ComponentArgs,
    ) -> Result<Instance> {
        let factory = self
            .factories
            .get(class_path)
            .ok_or_else(|| Error::UnknownClassPath {
                class_path: class_path.to_string(),
                available: self.class_paths(),
            })?;
        tracing::debug!(class_path, "instantiating model");
        factory(init_args, components)
    }
}
