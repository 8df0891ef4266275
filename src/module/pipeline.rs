//! The module pipeline wrapping a model with its four components

use super::hparams::ModuleHparams;
use super::model::{AnomalyModel, SetupContext};
use super::resolve::ComponentArg;
use super::trainer_args::TrainerArguments;
use crate::callback::{Component, ComponentCallback, TrainerFn};
use crate::data::{Batch, InferenceBatch};
use crate::error::Result;
use crate::learning_type::LearningType;
use crate::metrics::Evaluator;
use crate::post_processing::PostProcessor;
use crate::pre_processing::PreProcessor;
use crate::visualization::Visualizer;
use ndarray::{Array3, Array4};
use std::any::Any;

/// Object-safe lifecycle interface driven by the engine.
pub trait AnomalyModule: Send {
    /// Model name
    fn name(&self) -> &str;

    /// Learning type of the wrapped model
    fn learning_type(&self) -> LearningType;

    /// Trainer settings required by the wrapped model
    fn trainer_arguments(&self) -> TrainerArguments;

    /// Record of how the module was constructed
    fn hparams(&self) -> &ModuleHparams;

    /// Whether `setup` ran for a trainer entry point
    fn is_setup(&self) -> bool;

    /// Set up the wrapped model.
    ///
    /// Runs when the model is not built or the module was never set up.
    /// Only a call carrying a trainer entry point marks the module as set up.
    fn setup(&mut self, stage: Option<TrainerFn>) -> Result<()>;

    /// Pre-process, run the model and post-process.
    fn forward(&self, images: Array4<f32>) -> Result<InferenceBatch>;

    /// Training step of the wrapped model
    fn training_step(&mut self, batch: &Batch, batch_idx: usize) -> Result<Option<f32>>;

    /// End of a training epoch
    fn on_train_epoch_end(&mut self) -> Result<()>;

    /// Validation step of the wrapped model
    fn validation_step(&mut self, batch: Batch, batch_idx: usize) -> Result<Batch>;

    /// Predict step of the wrapped model
    fn predict_step(
        &mut self,
        batch: Batch,
        batch_idx: usize,
        dataloader_idx: usize,
    ) -> Result<Batch>;

    /// Test step of the wrapped model
    fn test_step(&mut self, batch: Batch, batch_idx: usize) -> Result<Batch>;

    /// Lifecycle callbacks of the present components, in slot order.
    fn configure_callbacks(&mut self) -> Vec<&mut dyn ComponentCallback>;

    /// Spatial size produced by the inference transform, if it changes it.
    fn input_size(&self) -> Result<Option<(usize, usize)>>;

    /// Convert into `Any` for downcasting to a concrete pipeline type.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A model together with its pre-processor, post-processor, evaluator and
/// visualizer.
///
/// # Example
///
/// ```ignore
/// let pipeline = ModulePipeline::builder(PixelStats::default())
///     .evaluator(false)
///     .build()?;
/// let predictions = pipeline.forward(images)?;
/// ```
#[derive(Debug)]
pub struct ModulePipeline<M: AnomalyModel> {
    model: M,
    pre_processor: Option<PreProcessor>,
    post_processor: Option<Box<dyn PostProcessor>>,
    evaluator: Option<Evaluator>,
    visualizer: Option<Box<dyn Visualizer>>,
    hparams: ModuleHparams,
    is_setup: bool,
}

/// Builder for [`ModulePipeline`]. Every slot defaults to `Flag(true)`.
pub struct ModulePipelineBuilder<M: AnomalyModel> {
    model: M,
    pre_processor: ComponentArg<PreProcessor>,
    post_processor: ComponentArg<Box<dyn PostProcessor>>,
    evaluator: ComponentArg<Evaluator>,
    visualizer: ComponentArg<Box<dyn Visualizer>>,
}

impl From<PreProcessor> for ComponentArg<PreProcessor> {
    fn from(pre_processor: PreProcessor) -> Self {
        Self::Instance(pre_processor)
    }
}

impl From<Evaluator> for ComponentArg<Evaluator> {
    fn from(evaluator: Evaluator) -> Self {
        Self::Instance(evaluator)
    }
}

impl<M: AnomalyModel> ModulePipelineBuilder<M> {
    /// Pre-processor slot
    pub fn pre_processor(mut self, arg: impl Into<ComponentArg<PreProcessor>>) -> Self {
        self.pre_processor = arg.into();
        self
    }

    /// Post-processor slot
    pub fn post_processor(mut self, arg: ComponentArg<Box<dyn PostProcessor>>) -> Self {
        self.post_processor = arg;
        self
    }

    /// Evaluator slot
    pub fn evaluator(mut self, arg: impl Into<ComponentArg<Evaluator>>) -> Self {
        self.evaluator = arg.into();
        self
    }

    /// Visualizer slot
    pub fn visualizer(mut self, arg: ComponentArg<Box<dyn Visualizer>>) -> Self {
        self.visualizer = arg;
        self
    }

    /// Resolve every slot and assemble the pipeline.
    ///
    /// Default factories only run for slots set to `true`.
    pub fn build(self) -> Result<ModulePipeline<M>> {
        let Self {
            model,
            pre_processor,
            post_processor,
            evaluator,
            visualizer,
        } = self;
        tracing::info!(model = model.name(), "Initializing module pipeline");

        let hparams = ModuleHparams {
            model: model.name().to_string(),
            learning_type: model.learning_type(),
            pre_processor: pre_processor.resolution(),
            post_processor: post_processor.resolution(),
            evaluator: evaluator.resolution(),
            visualizer: visualizer.resolution(),
            init_args: model.init_args(),
        };

        let pre_processor = pre_processor
            .resolve(|| Ok(M::configure_pre_processor(None)))?;
        let post_processor = post_processor.resolve(|| model.configure_post_processor())?;
        let evaluator = evaluator.resolve(|| Ok(M::configure_evaluator()))?;
        let visualizer = visualizer.resolve(|| Ok(M::configure_visualizer()))?;

        tracing::debug!(
            pre_processor = %hparams.pre_processor,
            post_processor = %hparams.post_processor,
            evaluator = %hparams.evaluator,
            visualizer = %hparams.visualizer,
            "component slots resolved"
        );

        Ok(ModulePipeline {
            model,
            pre_processor,
            post_processor,
            evaluator,
            visualizer,
            hparams,
            is_setup: false,
        })
    }
}

impl<M: AnomalyModel> ModulePipeline<M> {
    /// Pipeline with the model's default component in every slot.
    pub fn new(model: M) -> Result<Self> {
        Self::builder(model).build()
    }

    /// Start configuring the slots of a pipeline around `model`.
    pub fn builder(model: M) -> ModulePipelineBuilder<M> {
        ModulePipelineBuilder {
            model,
            pre_processor: ComponentArg::default(),
            post_processor: ComponentArg::default(),
            evaluator: ComponentArg::default(),
            visualizer: ComponentArg::default(),
        }
    }

    /// Default pre-processor of `M`
    pub fn configure_pre_processor(image_size: Option<(usize, usize)>) -> PreProcessor {
        M::configure_pre_processor(image_size)
    }

    /// Default post-processor of the wrapped model
    pub fn configure_post_processor(&self) -> Result<Box<dyn PostProcessor>> {
        self.model.configure_post_processor()
    }

    /// Default evaluator of `M`
    pub fn configure_evaluator() -> Evaluator {
        M::configure_evaluator()
    }

    /// Default visualizer of `M`
    pub fn configure_visualizer() -> Box<dyn Visualizer> {
        M::configure_visualizer()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn pre_processor(&self) -> Option<&PreProcessor> {
        self.pre_processor.as_ref()
    }

    pub fn post_processor(&self) -> Option<&dyn PostProcessor> {
        self.post_processor.as_deref()
    }

    pub fn evaluator(&self) -> Option<&Evaluator> {
        self.evaluator.as_ref()
    }

    pub fn visualizer(&self) -> Option<&dyn Visualizer> {
        self.visualizer.as_deref()
    }

    pub fn visualizer_mut(&mut self) -> Option<&mut (dyn Visualizer + 'static)> {
        self.visualizer.as_deref_mut()
    }
}

impl<M: AnomalyModel> AnomalyModule for ModulePipeline<M> {
    fn name(&self) -> &str {
        self.model.name()
    }

    fn learning_type(&self) -> LearningType {
        self.model.learning_type()
    }

    fn trainer_arguments(&self) -> TrainerArguments {
        self.model.trainer_arguments()
    }

    fn hparams(&self) -> &ModuleHparams {
        &self.hparams
    }

    fn is_setup(&self) -> bool {
        self.is_setup
    }

    fn setup(&mut self, stage: Option<TrainerFn>) -> Result<()> {
        if self.model.is_built() && self.is_setup {
            return Ok(());
        }
        let ctx = SetupContext {
            input_size: self.input_size()?,
            trainer_fn: stage,
        };
        tracing::debug!(
            model = self.model.name(),
            input_size = ?ctx.input_size,
            "setting up model"
        );
        self.model.setup(&ctx)?;
        if stage.is_some() {
            self.is_setup = true;
        }
        Ok(())
    }

    fn forward(&self, images: Array4<f32>) -> Result<InferenceBatch> {
        let images = match &self.pre_processor {
            Some(pre_processor) => pre_processor.forward(images)?,
            None => images,
        };
        let predictions = self.model.forward(&images)?;
        match &self.post_processor {
            Some(post_processor) => post_processor.forward(predictions),
            None => Ok(predictions),
        }
    }

    fn training_step(&mut self, batch: &Batch, batch_idx: usize) -> Result<Option<f32>> {
        self.model.training_step(batch, batch_idx)
    }

    fn on_train_epoch_end(&mut self) -> Result<()> {
        self.model.on_train_epoch_end()
    }

    fn validation_step(&mut self, batch: Batch, batch_idx: usize) -> Result<Batch> {
        self.model.validation_step(batch, batch_idx)
    }

    fn predict_step(
        &mut self,
        batch: Batch,
        batch_idx: usize,
        dataloader_idx: usize,
    ) -> Result<Batch> {
        self.model.predict_step(batch, batch_idx, dataloader_idx)
    }

    fn test_step(&mut self, batch: Batch, batch_idx: usize) -> Result<Batch> {
        self.model.test_step(batch, batch_idx)
    }

    fn configure_callbacks(&mut self) -> Vec<&mut dyn ComponentCallback> {
        let mut callbacks: Vec<&mut dyn ComponentCallback> = Vec::new();
        if let Some(pre_processor) = self.pre_processor.as_mut() {
            callbacks.extend(pre_processor.as_callback());
        }
        if let Some(post_processor) = self.post_processor.as_mut() {
            callbacks.extend(post_processor.as_callback());
        }
        if let Some(evaluator) = self.evaluator.as_mut() {
            callbacks.extend(evaluator.as_callback());
        }
        if let Some(visualizer) = self.visualizer.as_mut() {
            callbacks.extend(visualizer.as_callback());
        }
        callbacks
    }

    fn input_size(&self) -> Result<Option<(usize, usize)>> {
        let Some(transform) = self
            .pre_processor
            .as_ref()
            .and_then(PreProcessor::inference_transform)
        else {
            return Ok(None);
        };
        // Masks only see geometric transforms, so any channel count works here.
        let mask = transform.apply_mask(Array3::from_elem((1, 1, 1), false))?;
        let (_, height, width) = mask.dim();
        Ok(((height, width) != (1, 1)).then_some((height, width)))
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
