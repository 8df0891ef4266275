//! Interface implemented by every anomaly model variant

use super::trainer_args::TrainerArguments;
use crate::callback::TrainerFn;
use crate::data::{Batch, InferenceBatch};
use crate::error::{Error, Result};
use crate::learning_type::LearningType;
use crate::metrics::{Evaluator, EvaluatorConfig};
use crate::post_processing::{OneClassPostProcessor, PostProcessor};
use crate::pre_processing::{PreProcessor, DEFAULT_IMAGE_SIZE};
use crate::transforms::{Compose, Normalize, Resize};
use crate::visualization::{ImageVisualizer, Visualizer};
use ndarray::Array4;

/// Information handed to a model when it is set up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupContext {
    /// Spatial size images have after pre-processing, if known
    pub input_size: Option<(usize, usize)>,
    /// Trainer entry point that triggered the setup
    pub trainer_fn: Option<TrainerFn>,
}

/// A concrete anomaly model.
///
/// Variants supply their learning type, trainer arguments, forward pass and
/// validation step. Everything else has a default:
///
/// - `test_step` routes to `predict_step`, which routes to `validation_step`;
/// - `configure_*` build the default components of the four pipeline slots.
///
/// Any of these may be overridden independently.
pub trait AnomalyModel: Send + 'static {
    /// Model name for logging and hyperparameters
    fn name(&self) -> &str;

    /// Supervision regime of this variant
    fn learning_type(&self) -> LearningType;

    /// Trainer settings this variant requires
    fn trainer_arguments(&self) -> TrainerArguments;

    /// Whether the underlying model exists. Variants that build lazily return
    /// `false` until [`AnomalyModel::setup`] ran.
    fn is_built(&self) -> bool {
        true
    }

    /// Build data-dependent parts of the model.
    fn setup(&mut self, _ctx: &SetupContext) -> Result<()> {
        Ok(())
    }

    /// Run the model on pre-processed images.
    fn forward(&self, images: &Array4<f32>) -> Result<InferenceBatch>;

    /// Consume one training batch, returning the loss if the model has one.
    fn training_step(&mut self, _batch: &Batch, _batch_idx: usize) -> Result<Option<f32>> {
        Ok(None)
    }

    /// Called after the last training batch of an epoch.
    fn on_train_epoch_end(&mut self) -> Result<()> {
        Ok(())
    }

    /// Predict on a validation batch and return it with predictions attached.
    fn validation_step(&mut self, batch: Batch, batch_idx: usize) -> Result<Batch>;

    /// Predict on an inference batch. Defaults to the validation step.
    fn predict_step(
        &mut self,
        batch: Batch,
        batch_idx: usize,
        _dataloader_idx: usize,
    ) -> Result<Batch> {
        self.validation_step(batch, batch_idx)
    }

    /// Predict on a test batch. Defaults to the predict step.
    fn test_step(&mut self, batch: Batch, batch_idx: usize) -> Result<Batch> {
        self.predict_step(batch, batch_idx, 0)
    }

    /// Constructor arguments recorded with the module hyperparameters.
    fn init_args(&self) -> serde_yaml::Value {
        serde_yaml::Value::Null
    }

    /// Default pre-processor: resize to `image_size` (256x256 when absent)
    /// followed by ImageNet normalization.
    fn configure_pre_processor(image_size: Option<(usize, usize)>) -> PreProcessor
    where
        Self: Sized,
    {
        let (height, width) = image_size.unwrap_or(DEFAULT_IMAGE_SIZE);
        let transform = Compose::new()
            .then(Resize::new(height, width))
            .then(Normalize::imagenet());
        PreProcessor::with_transform(transform)
    }

    /// Default post-processor for this variant's learning type.
    ///
    /// Only one-class models have a built-in default; other learning types
    /// must override this method or receive an explicit post-processor.
    fn configure_post_processor(&self) -> Result<Box<dyn PostProcessor>> {
        match self.learning_type() {
            LearningType::OneClass => Ok(Box::new(OneClassPostProcessor::default())),
            learning_type => Err(Error::NoDefaultPostProcessor { learning_type }),
        }
    }

    /// Default evaluator with image- and pixel-level AUROC and F1 test metrics.
    fn configure_evaluator() -> Evaluator
    where
        Self: Sized,
    {
        EvaluatorConfig::default().build()
    }

    /// Default visualizer.
    fn configure_visualizer() -> Box<dyn Visualizer>
    where
        Self: Sized,
    {
        Box::new(ImageVisualizer::default())
    }
}
