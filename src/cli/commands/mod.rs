//! CLI command implementations

mod info;
mod validate;


use super::args::{Cli, Command};
use crate::config::{instantiate, load_config, Instance, ModelRegistry};
use crate::error::{Error, Result};
use crate::module::{ModuleHparams, TrainerArguments};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> std::result::Result<(), String> {
    let log_level = cli.log_level();

    match cli.command {
        Command::Validate(args) => validate::run_validate(args, log_level),
        Command::Info(args) => info::run_info(args, log_level),
    }
}

/// Resolved view of a configured pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Configuration file the pipeline was built from
    pub config: PathBuf,
    /// How the pipeline was constructed
    pub hparams: ModuleHparams,
    /// Configured trainer arguments merged with the model's requirements
    pub trainer: TrainerArguments,
    /// Spatial size produced by the pre-processor, if it resizes
    pub input_size: Option<(usize, usize)>,
    /// Lifecycle callbacks contributed by the pipeline components
    pub callbacks: Vec<String>,
    /// Model class paths known to the registry
    pub available_models: Vec<String>,
}

/// Load a configuration with the built-in registry and describe the pipeline.
pub fn build_report(path: &Path, overrides: &[String]) -> Result<PipelineReport> {
    let registry = ModelRegistry::with_builtin();
    let config = load_config(path, overrides)?;
    let mut module = match instantiate(&config, &registry)? {
        Instance::Module(module) => module,
        Instance::Other { type_name } => {
            return Err(Error::InvalidModel {
                expected: "an anomaly module".into(),
                found: type_name,
            })
        }
    };

    let trainer = config.trainer.merge(&module.trainer_arguments());
    let input_size = module.input_size()?;
    let callbacks = module
        .configure_callbacks()
        .iter()
        .map(|callback| callback.name().to_string())
        .collect();

    Ok(PipelineReport {
        config: path.to_path_buf(),
        hparams: module.hparams().clone(),
        trainer,
        input_size,
        callbacks,
        available_models: registry.class_paths(),
    })
}
