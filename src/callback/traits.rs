//! Core traits and types for the component callback system
//!
//! This module provides the foundational types for lifecycle callbacks:
//! - `TrainerFn` / `Stage` - which trainer function and loop is running
//! - `ComponentCallback` - hooks a component may implement
//! - `Component` - the capability query the pipeline uses to collect callbacks

use crate::data::Batch;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trainer entry point that triggered a setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainerFn {
    /// Training with validation
    Fit,
    /// Standalone validation
    Validate,
    /// Testing
    Test,
    /// Inference
    Predict,
}

/// Loop currently executing batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Training batches
    Train,
    /// Validation batches
    Validation,
    /// Test batches
    Test,
    /// Prediction batches
    Predict,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Train => "train",
            Self::Validation => "validation",
            Self::Test => "test",
            Self::Predict => "predict",
        };
        f.write_str(name)
    }
}

/// The four optional component slots of a module pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentSlot {
    /// Input transforms bracketing the model on the way in
    PreProcessor,
    /// Output refinement bracketing the model on the way out
    PostProcessor,
    /// Metric bookkeeping
    Evaluator,
    /// Diagnostic output
    Visualizer,
}

impl ComponentSlot {
    /// All slots in resolution order.
    pub const ALL: [ComponentSlot; 4] =
        [Self::PreProcessor, Self::PostProcessor, Self::Evaluator, Self::Visualizer];

    /// Key used for the slot in configuration files.
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::PreProcessor => "pre_processor",
            Self::PostProcessor => "post_processor",
            Self::Evaluator => "evaluator",
            Self::Visualizer => "visualizer",
        }
    }
}

impl fmt::Display for ComponentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreProcessor => "pre-processor",
            Self::PostProcessor => "post-processor",
            Self::Evaluator => "evaluator",
            Self::Visualizer => "visualizer",
        };
        f.write_str(name)
    }
}

/// Lifecycle hooks a pipeline component may implement.
///
/// All methods have default no-op implementations, so a component only
/// implements the events it cares about.
pub trait ComponentCallback: Send {
    /// Called once per trainer entry point, after the module is set up
    fn on_setup(&mut self, _trainer_fn: TrainerFn) -> Result<()> {
        Ok(())
    }

    /// Called before a batch reaches the step hook
    fn on_batch_start(&mut self, _stage: Stage, _batch: &mut Batch) -> Result<()> {
        Ok(())
    }

    /// Called with the step output of each batch
    fn on_batch_end(&mut self, _stage: Stage, _outputs: &mut Batch) -> Result<()> {
        Ok(())
    }

    /// Called after the last batch of a loop
    fn on_epoch_end(&mut self, _stage: Stage) -> Result<()> {
        Ok(())
    }

    /// Get callback name for logging
    fn name(&self) -> &'static str {
        "ComponentCallback"
    }
}

/// A pipeline component.
///
/// Components that take part in the trainer lifecycle declare it by
/// returning themselves from [`Component::as_callback`].
pub trait Component: Send + fmt::Debug {
    /// Callback view of this component, if it has one
    fn as_callback(&mut self) -> Option<&mut dyn ComponentCallback> {
        None
    }
}
