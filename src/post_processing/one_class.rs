//! Post-processor for one-class models
//!
//! Learns image and pixel thresholds plus min/max statistics from validation
//! outputs, then normalises scores so that the threshold maps to 0.5 and
//! derives binary predictions.

use super::threshold::f1_adaptive_threshold;
use super::PostProcessor;
use crate::callback::{Component, ComponentCallback, Stage};
use crate::data::{Batch, InferenceBatch};
use crate::error::{Error, Result};
use ndarray::{Array3, Zip};
use serde::{Deserialize, Serialize};

/// Normalised value corresponding to the threshold
const NORMALIZED_THRESHOLD: f32 = 0.5;

/// Declarative form of [`OneClassPostProcessor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneClassPostProcessorConfig {
    /// Min-max normalise scores around the threshold
    #[serde(default = "bool_true")]
    pub enable_normalization: bool,
    /// Derive binary predictions from scores
    #[serde(default = "bool_true")]
    pub enable_thresholding: bool,
    /// Fixed image threshold; learned from validation when absent
    #[serde(default)]
    pub image_threshold: Option<f32>,
    /// Fixed pixel threshold; learned from validation when absent
    #[serde(default)]
    pub pixel_threshold: Option<f32>,
}

impl Default for OneClassPostProcessorConfig {
    fn default() -> Self {
        Self {
            enable_normalization: true,
            enable_thresholding: true,
            image_threshold: None,
            pixel_threshold: None,
        }
    }
}

fn bool_true() -> bool {
    true
}

/// Running min/max of observed values.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    min: f32,
    max: f32,
}

impl Range {
    fn extend(range: Option<Self>, values: impl Iterator<Item = f32>) -> Option<Self> {
        values.fold(range, |acc, v| match acc {
            Some(r) => Some(Self {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
            None => Some(Self { min: v, max: v }),
        })
    }

    fn normalize(&self, value: f32, threshold: f32) -> f32 {
        let span = (self.max - self.min).max(f32::EPSILON);
        ((value - threshold) / span + NORMALIZED_THRESHOLD).clamp(0.0, 1.0)
    }
}

/// Validation outputs collected until the end of the validation epoch.
#[derive(Debug, Clone, Default)]
struct ValidationStats {
    scores: Vec<f32>,
    labels: Vec<bool>,
    map_values: Vec<f32>,
    mask_values: Vec<bool>,
    image_range: Option<Range>,
    pixel_range: Option<Range>,
}

/// Threshold-and-normalise post-processor for one-class learning.
#[derive(Debug, Clone)]
pub struct OneClassPostProcessor {
    config: OneClassPostProcessorConfig,
    image_threshold: Option<f32>,
    pixel_threshold: Option<f32>,
    image_range: Option<Range>,
    pixel_range: Option<Range>,
    stats: ValidationStats,
}

impl Default for OneClassPostProcessor {
    fn default() -> Self {
        Self::new(OneClassPostProcessorConfig::default())
    }
}

impl OneClassPostProcessor {
    /// Create a post-processor from its configuration.
    pub fn new(config: OneClassPostProcessorConfig) -> Self {
        Self {
            image_threshold: config.image_threshold,
            pixel_threshold: config.pixel_threshold,
            config,
            image_range: None,
            pixel_range: None,
            stats: ValidationStats::default(),
        }
    }

    /// Configuration this post-processor was built from
    pub fn config(&self) -> &OneClassPostProcessorConfig {
        &self.config
    }

    /// Current image threshold, fixed or learned
    pub fn image_threshold(&self) -> Option<f32> {
        self.image_threshold
    }

    /// Current pixel threshold; falls back to the image threshold
    pub fn pixel_threshold(&self) -> Option<f32> {
        self.pixel_threshold.or(self.image_threshold)
    }

    /// Set the observed image score range used for normalization.
    pub fn set_image_range(&mut self, min: f32, max: f32) {
        self.image_range = Some(Range { min, max });
    }

    /// Set the observed anomaly map range used for normalization.
    pub fn set_pixel_range(&mut self, min: f32, max: f32) {
        self.pixel_range = Some(Range { min, max });
    }

    fn accumulate(&mut self, outputs: &Batch) -> Result<()> {
        if let Some(scores) = &outputs.pred_score {
            self.stats.image_range = Range::extend(self.stats.image_range, scores.iter().copied());
            if let Some(labels) = &outputs.gt_label {
                if labels.len() != scores.len() {
                    return Err(Error::ShapeMismatch {
                        expected: vec![scores.len()],
                        actual: vec![labels.len()],
                    });
                }
                self.stats.scores.extend(scores.iter().copied());
                self.stats.labels.extend(labels.iter().copied());
            }
        }
        if let Some(map) = &outputs.anomaly_map {
            self.stats.pixel_range = Range::extend(self.stats.pixel_range, map.iter().copied());
            if let Some(mask) = &outputs.gt_mask {
                if mask.shape() != map.shape() {
                    return Err(Error::ShapeMismatch {
                        expected: map.shape().to_vec(),
                        actual: mask.shape().to_vec(),
                    });
                }
                self.stats.map_values.extend(map.iter().copied());
                self.stats.mask_values.extend(mask.iter().copied());
            }
        }
        Ok(())
    }

    fn finish_validation(&mut self) {
        let stats = std::mem::take(&mut self.stats);
        if self.config.image_threshold.is_none() {
            if let Some(t) = f1_adaptive_threshold(&stats.scores, &stats.labels) {
                self.image_threshold = Some(t);
            }
        }
        if self.config.pixel_threshold.is_none() {
            if let Some(t) = f1_adaptive_threshold(&stats.map_values, &stats.mask_values) {
                self.pixel_threshold = Some(t);
            }
        }
        self.image_range = stats.image_range.or(self.image_range);
        self.pixel_range = stats.pixel_range.or(self.pixel_range);

        tracing::info!(
            image_threshold = ?self.image_threshold,
            pixel_threshold = ?self.pixel_threshold(),
            "post-processor statistics updated"
        );
    }

    /// Threshold and range used to normalise image scores, when both are known.
    fn image_normalization(&self) -> Option<(f32, Range)> {
        if !self.config.enable_normalization {
            return None;
        }
        Some((self.image_threshold?, self.image_range?))
    }

    /// Threshold and range used to normalise anomaly maps. Image-score
    /// ranges are never used for maps.
    fn pixel_normalization(&self) -> Option<(f32, Range)> {
        if !self.config.enable_normalization {
            return None;
        }
        Some((self.pixel_threshold()?, self.pixel_range?))
    }
}

impl PostProcessor for OneClassPostProcessor {
    fn forward(&self, predictions: InferenceBatch) -> Result<InferenceBatch> {
        let InferenceBatch {
            mut pred_score,
            mut pred_label,
            mut anomaly_map,
            mut pred_mask,
        } = predictions;

        if pred_score.is_none() {
            if let Some(map) = &anomaly_map {
                pred_score = InferenceBatch::from_anomaly_map(map.clone()).pred_score;
            }
        }

        // Labels compare against 0.5 only where values were actually normalised.
        let mut image_threshold = self.image_threshold;
        if let Some((t, range)) = self.image_normalization() {
            pred_score = pred_score.map(|scores| scores.mapv(|v| range.normalize(v, t)));
            image_threshold = Some(NORMALIZED_THRESHOLD);
        }
        let mut pixel_threshold = self.pixel_threshold();
        if let Some((t, range)) = self.pixel_normalization() {
            anomaly_map = anomaly_map.map(|map| map.mapv(|v| range.normalize(v, t)));
            pixel_threshold = Some(NORMALIZED_THRESHOLD);
        }

        if self.config.enable_thresholding {
            if let (Some(scores), Some(t)) = (&pred_score, image_threshold) {
                pred_label = Some(scores.mapv(|s| s >= t));
            }
            if let (Some(map), Some(t)) = (&anomaly_map, pixel_threshold) {
                let mut mask = Array3::from_elem(map.raw_dim(), false);
                Zip::from(&mut mask).and(map).for_each(|m, &v| *m = v >= t);
                pred_mask = Some(mask);
            }
        }

        Ok(InferenceBatch {
            pred_score,
            pred_label,
            anomaly_map,
            pred_mask,
        })
    }

    fn name(&self) -> &'static str {
        "OneClassPostProcessor"
    }
}

impl Component for OneClassPostProcessor {
    fn as_callback(&mut self) -> Option<&mut dyn ComponentCallback> {
        Some(self)
    }
}

impl ComponentCallback for OneClassPostProcessor {
    fn on_batch_end(&mut self, stage: Stage, outputs: &mut Batch) -> Result<()> {
        match stage {
            Stage::Validation => self.accumulate(outputs),
            Stage::Test | Stage::Predict => {
                let processed = self.forward(outputs.predictions())?;
                outputs.update(processed);
                Ok(())
            }
            Stage::Train => Ok(()),
        }
    }

    fn on_epoch_end(&mut self, stage: Stage) -> Result<()> {
        if stage == Stage::Validation {
            self.finish_validation();
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "OneClassPostProcessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3, Array4};

    fn validation_batch() -> Batch {
        let masks = Array3::from_shape_fn((4, 2, 2), |(n, y, x)| n >= 2 && y == 0 && x == 0);
        let mut batch = Batch::new(Array4::zeros((4, 1, 2, 2)))
            .with_labels(array![false, false, true, true])
            .with_masks(masks);
        let map = Array3::from_shape_fn((4, 2, 2), |(n, y, x)| {
            if n >= 2 && y == 0 && x == 0 {
                4.0
            } else {
                1.0
            }
        });
        batch.update(InferenceBatch {
            pred_score: Some(array![1.0, 2.0, 6.0, 8.0]),
            anomaly_map: Some(map),
            ..Default::default()
        });
        batch
    }

    #[test]
    fn test_learns_thresholds_from_validation() {
        let mut post = OneClassPostProcessor::default();
        let mut batch = validation_batch();
        post.on_batch_end(Stage::Validation, &mut batch)
            .expect("accumulate");
        post.on_epoch_end(Stage::Validation).expect("finish");

        assert_eq!(post.image_threshold(), Some(6.0));
        assert_eq!(post.pixel_threshold(), Some(4.0));
        // validation outputs are left raw
        assert_eq!(batch.pred_score, Some(array![1.0, 2.0, 6.0, 8.0]));
    }

    #[test]
    fn test_normalized_threshold_maps_to_half() {
        let mut post = OneClassPostProcessor::default();
        let mut batch = validation_batch();
        post.on_batch_end(Stage::Validation, &mut batch)
            .expect("accumulate");
        post.on_epoch_end(Stage::Validation).expect("finish");

        let out = post
            .forward(InferenceBatch::from_scores(array![6.0, 1.0, 8.0]))
            .expect("forward");
        let scores = out.pred_score.expect("scores");
        // range 1..8 -> span 7
        assert_abs_diff_eq!(scores[0], 0.5, epsilon = 1e-6);
        // (1 - 6) / 7 + 0.5 is negative and clamps to zero
        assert_abs_diff_eq!(scores[1], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(scores[2], 0.5 + 2.0 / 7.0, epsilon = 1e-6);
        assert_eq!(out.pred_label, Some(array![true, false, true]));
    }

    #[test]
    fn test_normalized_values_are_bounded() {
        let mut post = OneClassPostProcessor::new(OneClassPostProcessorConfig {
            image_threshold: Some(0.0),
            ..Default::default()
        });
        post.set_image_range(0.0, 1.0);
        let out = post
            .forward(InferenceBatch::from_scores(array![-10.0, 10.0]))
            .expect("forward");
        assert_eq!(out.pred_score, Some(array![0.0, 1.0]));
    }

    #[test]
    fn test_without_normalization_uses_raw_threshold() {
        let post = OneClassPostProcessor::new(OneClassPostProcessorConfig {
            enable_normalization: false,
            image_threshold: Some(0.3),
            ..Default::default()
        });
        let out = post
            .forward(InferenceBatch::from_scores(array![0.2, 0.3, 0.9]))
            .expect("forward");
        assert_eq!(out.pred_score, Some(array![0.2, 0.3, 0.9]));
        assert_eq!(out.pred_label, Some(array![false, true, true]));
    }

    #[test]
    fn test_fixed_threshold_without_range_labels_raw_scores() {
        let post = OneClassPostProcessor::new(OneClassPostProcessorConfig {
            image_threshold: Some(0.3),
            ..Default::default()
        });
        let out = post
            .forward(InferenceBatch::from_scores(array![0.2, 0.4, 0.6]))
            .expect("forward");
        assert_eq!(out.pred_score, Some(array![0.2, 0.4, 0.6]));
        assert_eq!(out.pred_label, Some(array![false, true, true]));
    }

    #[test]
    fn test_fixed_pixel_threshold_without_range_labels_raw_map() {
        let post = OneClassPostProcessor::new(OneClassPostProcessorConfig {
            pixel_threshold: Some(0.3),
            ..Default::default()
        });
        let map = Array3::from_shape_vec((1, 1, 3), vec![0.2, 0.4, 0.6]).expect("map");
        let out = post
            .forward(InferenceBatch {
                anomaly_map: Some(map.clone()),
                ..Default::default()
            })
            .expect("forward");
        assert_eq!(out.anomaly_map, Some(map));
        let mask = out.pred_mask.expect("mask");
        assert_eq!(
            mask.iter().copied().collect::<Vec<_>>(),
            vec![false, true, true]
        );
    }

    #[test]
    fn test_map_not_normalized_with_image_range() {
        let mut post = OneClassPostProcessor::new(OneClassPostProcessorConfig {
            image_threshold: Some(5.0),
            ..Default::default()
        });
        post.set_image_range(0.0, 10.0);
        let map = Array3::from_shape_vec((1, 1, 2), vec![4.0, 6.0]).expect("map");
        let out = post
            .forward(InferenceBatch {
                pred_score: Some(array![6.0]),
                anomaly_map: Some(map.clone()),
                ..Default::default()
            })
            .expect("forward");

        let scores = out.pred_score.expect("scores");
        assert_abs_diff_eq!(scores[0], 0.6, epsilon = 1e-6);
        assert_eq!(out.pred_label, Some(array![true]));
        assert_eq!(out.anomaly_map, Some(map));
        let mask = out.pred_mask.expect("mask");
        assert_eq!(mask.iter().copied().collect::<Vec<_>>(), vec![false, true]);
    }

    #[test]
    fn test_unfitted_passes_scores_through() {
        let post = OneClassPostProcessor::default();
        let scores = InferenceBatch::from_scores(array![0.7]);
        let out = post.forward(scores).expect("forward");
        assert_eq!(out.pred_score, Some(array![0.7]));
        assert!(out.pred_label.is_none());
    }

    #[test]
    fn test_score_derived_from_map() {
        let post = OneClassPostProcessor::new(OneClassPostProcessorConfig {
            enable_normalization: false,
            image_threshold: Some(0.5),
            ..Default::default()
        });
        let map = Array3::from_shape_fn((1, 2, 2), |(_, y, x)| (y + x) as f32 * 0.4);
        let out = post
            .forward(InferenceBatch {
                anomaly_map: Some(map),
                ..Default::default()
            })
            .expect("forward");
        assert_eq!(out.pred_score, Some(array![0.8]));
        let mask = out.pred_mask.expect("mask");
        assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
    }

    #[test]
    fn test_test_stage_post_processes_outputs() {
        let mut post = OneClassPostProcessor::new(OneClassPostProcessorConfig {
            enable_normalization: false,
            image_threshold: Some(0.5),
            ..Default::default()
        });
        let mut batch = Batch::new(Array4::zeros((2, 1, 1, 1)));
        batch.update(InferenceBatch::from_scores(array![0.1, 0.9]));
        post.on_batch_end(Stage::Test, &mut batch)
            .expect("post-process");
        assert_eq!(batch.pred_label, Some(array![false, true]));
    }

    #[test]
    fn test_mismatched_mask_is_rejected() {
        let mut post = OneClassPostProcessor::default();
        let mut batch = Batch::new(Array4::zeros((1, 1, 2, 2)))
            .with_masks(Array3::from_elem((1, 3, 3), false));
        batch.update(InferenceBatch {
            anomaly_map: Some(Array3::zeros((1, 2, 2))),
            ..Default::default()
        });
        let err = post
            .on_batch_end(Stage::Validation, &mut batch)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
