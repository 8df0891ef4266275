//! Loading modules from YAML configuration files

use super::components::ComponentArgs;
use super::overrides::apply_overrides;
use super::registry::{Instance, ModelRegistry};
use super::schema::ModuleConfig;
use crate::error::{Error, Result};
use crate::module::{AnomalyModel, AnomalyModule, ModulePipeline};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Read, override and parse a module configuration file.
///
/// The path is checked before anything is parsed, so a missing file is
/// always reported as [`Error::ConfigNotFound`].
pub fn load_config<P: AsRef<Path>>(path: P, overrides: &[String]) -> Result<ModuleConfig> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let msg = format!("Failed to read config file {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| Error::io(msg, e))?;

    let mut document: Value = serde_yaml::from_str(&content)
        .map_err(|e| Error::ConfigParsing {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    apply_overrides(&mut document, overrides)?;

    let config: ModuleConfig = serde_yaml::from_value(document)
        .map_err(|e| Error::ConfigParsing {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tracing::info!(
        path = %path.display(),
        overrides = overrides.len(),
        "Loaded module configuration"
    );
    Ok(config)
}

/// Instantiate the object a parsed configuration names.
pub fn instantiate(config: &ModuleConfig, registry: &ModelRegistry) -> Result<Instance> {
    let model = config.model.as_ref().ok_or_else(|| Error::InvalidModel {
        expected: "an anomaly module".into(),
        found: "no model section in the configuration".into(),
    })?;

    let mut init_args = model.init_args.clone();
    let components = ComponentArgs::take_from(&mut init_args, config.metrics.as_ref())?;
    let init_args = if init_args.is_empty() { Value::Null } else { Value::Mapping(init_args) };

    registry.instantiate(&model.class_path, &init_args, components)
}

/// Load any registered anomaly module from a configuration file.
pub fn load_module<P: AsRef<Path>>(
    path: P,
    registry: &ModelRegistry,
    overrides: &[String],
) -> Result<Box<dyn AnomalyModule>> {
    let config = load_config(path, overrides)?;
    match instantiate(&config, registry)? {
        Instance::Module(module) => Ok(module),
        Instance::Other { type_name } => Err(Error::InvalidModel {
            expected: "an anomaly module".into(),
            found: type_name,
        }),
    }
}

impl<M: AnomalyModel> ModulePipeline<M> {
    /// Build a pipeline of model type `M` from a configuration file.
    ///
    /// Fails with [`Error::ConfigNotFound`] for a missing file and with
    /// [`Error::InvalidModel`] when the configured class is not a pipeline
    /// around `M`.
    pub fn from_config<P: AsRef<Path>>(
        path: P,
        registry: &ModelRegistry,
        overrides: &[String],
    ) -> Result<Self> {
        let expected = std::any::type_name::<Self>().to_string();
        let module = load_module(path, registry, overrides).map_err(|e| match e {
            Error::InvalidModel { found, .. } => {
                Error::InvalidModel {
                    expected: expected.clone(),
                    found,
                }
            }
            other => other,
        })?;
        let found = module.name().to_string();
        module
            .into_any()
            .downcast::<Self>()
            .map(|pipeline| *pipeline)
            .map_err(|_| Error::InvalidModel { expected, found })
    }
}
