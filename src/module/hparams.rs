//! Hyperparameters recorded when a pipeline is built

use super::resolve::SlotResolution;
use crate::learning_type::LearningType;
use serde::{Deserialize, Serialize};

/// Snapshot of how a pipeline was constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleHparams {
    /// Model name
    pub model: String,
    /// Learning type of the model
    pub learning_type: LearningType,
    /// Pre-processor slot
    pub pre_processor: SlotResolution,
    /// Post-processor slot
    pub post_processor: SlotResolution,
    /// Evaluator slot
    pub evaluator: SlotResolution,
    /// Visualizer slot
    pub visualizer: SlotResolution,
    /// Model constructor arguments
    #[serde(default, skip_serializing_if = "serde_yaml::Value::is_null")]
    pub init_args: serde_yaml::Value,
}

impl ModuleHparams {
    /// Render as YAML.
    pub fn to_yaml(&self) -> crate::error::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
