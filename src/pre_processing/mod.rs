//! Pre-processing of input batches
//!
//! A [`PreProcessor`] holds one transform per stage, each falling back to a
//! shared transform. As a callback it transforms batches before they reach
//! the step hooks; its predict-stage transform is what [`PreProcessor::forward`]
//! applies during inference through the module pipeline.

use crate::callback::{Component, ComponentCallback, Stage};
use crate::data::Batch;
use crate::error::{Error, Result};
use crate::transforms::{Compose, Normalize, Resize, Transform, IMAGENET_MEAN, IMAGENET_STD};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default image size of the default pre-processor
pub const DEFAULT_IMAGE_SIZE: (usize, usize) = (256, 256);

/// Stage-aware image transform component.
#[derive(Debug, Clone, Default)]
pub struct PreProcessor {
    transform: Option<Arc<dyn Transform>>,
    train_transform: Option<Arc<dyn Transform>>,
    val_transform: Option<Arc<dyn Transform>>,
    test_transform: Option<Arc<dyn Transform>>,
    predict_transform: Option<Arc<dyn Transform>>,
}

impl PreProcessor {
    /// Pre-processor without any transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-processor applying `transform` in every stage.
    pub fn with_transform<T: Transform + 'static>(transform: T) -> Self {
        Self {
            transform: Some(Arc::new(transform)),
            ..Self::default()
        }
    }

    /// Override the training transform.
    pub fn train_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.train_transform = Some(Arc::new(transform));
        self
    }

    /// Override the validation transform.
    pub fn val_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.val_transform = Some(Arc::new(transform));
        self
    }

    /// Override the test transform.
    pub fn test_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.test_transform = Some(Arc::new(transform));
        self
    }

    /// Override the inference transform.
    pub fn predict_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.predict_transform = Some(Arc::new(transform));
        self
    }

    /// Transform used in `stage`, if any.
    pub fn transform_for(&self, stage: Stage) -> Option<&dyn Transform> {
        let specific = match stage {
            Stage::Train => &self.train_transform,
            Stage::Validation => &self.val_transform,
            Stage::Test => &self.test_transform,
            Stage::Predict => &self.predict_transform,
        };
        specific
            .as_ref()
            .or(self.transform.as_ref())
            .map(|t| t.as_ref())
    }

    /// Transform used at inference time, if any.
    pub fn inference_transform(&self) -> Option<&dyn Transform> {
        self.transform_for(Stage::Predict)
    }

    /// Apply the inference transform to raw images.
    pub fn forward(&self, images: Array4<f32>) -> Result<Array4<f32>> {
        match self.inference_transform() {
            Some(t) => t.apply(images),
            None => Ok(images),
        }
    }
}

impl Component for PreProcessor {
    fn as_callback(&mut self) -> Option<&mut dyn ComponentCallback> {
        Some(self)
    }
}

impl ComponentCallback for PreProcessor {
    fn on_batch_start(&mut self, stage: Stage, batch: &mut Batch) -> Result<()> {
        let Some(transform) = self.transform_for(stage) else {
            return Ok(());
        };
        let image = std::mem::replace(&mut batch.image, Array4::zeros((0, 0, 0, 0)));
        batch.image = transform.apply(image)?;
        if let Some(mask) = batch.gt_mask.take() {
            batch.gt_mask = Some(transform.apply_mask(mask)?);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "PreProcessor"
    }
}

/// Declarative form of the default pre-processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreProcessorConfig {
    /// Target `[height, width]`
    #[serde(default = "default_image_size")]
    pub image_size: [usize; 2],
    /// Whether to normalize after resizing
    #[serde(default = "bool_true")]
    pub normalize: bool,
    /// Per-channel means
    #[serde(default = "default_mean")]
    pub mean: Vec<f32>,
    /// Per-channel standard deviations
    #[serde(default = "default_std")]
    pub std: Vec<f32>,
}

impl Default for PreProcessorConfig {
    fn default() -> Self {
        Self {
            image_size: default_image_size(),
            normalize: true,
            mean: default_mean(),
            std: default_std(),
        }
    }
}

fn default_image_size() -> [usize; 2] {
    [DEFAULT_IMAGE_SIZE.0, DEFAULT_IMAGE_SIZE.1]
}

fn default_mean() -> Vec<f32> {
    IMAGENET_MEAN.to_vec()
}

fn default_std() -> Vec<f32> {
    IMAGENET_STD.to_vec()
}

fn bool_true() -> bool {
    true
}

impl PreProcessorConfig {
    /// Build the pre-processor this configuration describes.
    pub fn build(&self) -> Result<PreProcessor> {
        let [height, width] = self.image_size;
        if height == 0 || width == 0 {
            return Err(Error::config_value(
                "pre_processor.image_size",
                format!("{height}x{width} has a zero side"),
                "Use a positive size such as [256, 256]",
            ));
        }
        let (means, stds) = (self.mean.len(), self.std.len());
        if means != stds {
            return Err(Error::config_value(
                "pre_processor.mean",
                format!("{means} means for {stds} standard deviations"),
                "Give one mean and one std per channel",
            ));
        }

        let mut transform = Compose::new().then(Resize::new(height, width));
        if self.normalize {
            transform = transform.then(Normalize::new(self.mean.clone(), self.std.clone()));
        }
        Ok(PreProcessor::with_transform(transform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[derive(Debug)]
    struct Scale(f32);

    impl Transform for Scale {
        fn apply(&self, images: Array4<f32>) -> Result<Array4<f32>> {
            Ok(images * self.0)
        }
        fn name(&self) -> &'static str {
            "Scale"
        }
    }

    #[test]
    fn test_stage_transform_falls_back_to_shared() {
        let pre = PreProcessor::with_transform(Scale(2.0)).test_transform(Scale(3.0));
        let images = Array4::from_elem((1, 1, 1, 1), 1.0);

        let train = pre
            .transform_for(Stage::Train)
            .expect("shared")
            .apply(images.clone());
        let test = pre
            .transform_for(Stage::Test)
            .expect("override")
            .apply(images.clone());
        assert_eq!(train.expect("train")[[0, 0, 0, 0]], 2.0);
        assert_eq!(test.expect("test")[[0, 0, 0, 0]], 3.0);
    }

    #[test]
    fn test_forward_without_transform_is_identity() {
        let images = Array4::from_elem((1, 3, 2, 2), 0.3);
        let pre = PreProcessor::new();
        let out = pre.forward(images.clone()).expect("forward");
        assert_eq!(out, images);
        assert!(pre.inference_transform().is_none());
    }

    #[test]
    fn test_batch_start_transforms_image_and_mask() {
        let mut pre = PreProcessorConfig {
            image_size: [4, 4],
            normalize: false,
            ..Default::default()
        }
        .build()
        .expect("build");

        let mut batch = Batch::new(Array4::from_elem((2, 3, 2, 2), 1.0))
            .with_masks(Array3::from_elem((2, 2, 2), true));
        pre.on_batch_start(Stage::Validation, &mut batch)
            .expect("transform");

        assert_eq!(batch.image.shape(), &[2, 3, 4, 4]);
        assert_eq!(
            batch.gt_mask.as_ref().map(|m| m.shape().to_vec()),
            Some(vec![2, 4, 4])
        );
    }

    #[test]
    fn test_pre_processor_is_callback_capable() {
        let mut pre = PreProcessor::new();
        let cb = pre.as_callback().expect("capability");
        assert_eq!(cb.name(), "PreProcessor");
    }

    #[test]
    fn test_config_defaults() {
        let config: PreProcessorConfig = serde_yaml::from_str("{}").expect("parse");
        assert_eq!(config.image_size, [256, 256]);
        assert!(config.normalize);
        assert_eq!(config.mean.len(), 3);
    }

    #[test]
    fn test_config_rejects_mismatched_statistics() {
        let config = PreProcessorConfig {
            mean: vec![0.5],
            ..Default::default()
        };
        assert!(matches!(config.build(), Err(Error::ConfigValue { .. })));
    }
}
