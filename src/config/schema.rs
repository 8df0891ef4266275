//! YAML schema of module configuration files

use crate::metrics::MetricsConfig;
use crate::module::TrainerArguments;
use serde::{Deserialize, Serialize};

/// Complete module configuration
///
/// ```yaml
/// model:
///   class_path: PixelStats
///   init_args:
///     eps: 0.001
///     evaluator: false
/// metrics:
///   pixel: [AUROC]
/// trainer:
///   max_epochs: 1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Model to instantiate
    #[serde(default)]
    pub model: Option<ModelSection>,

    /// Metrics declared for the evaluator
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,

    /// Trainer settings supplied by the user
    #[serde(default)]
    pub trainer: TrainerArguments,
}

/// Model reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    /// Registered name of the model
    pub class_path: String,

    /// Model constructor arguments plus the four component slots
    #[serde(default)]
    pub init_args: serde_yaml::Mapping,
}
