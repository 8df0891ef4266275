//! Per-channel normalization

use super::Transform;
use crate::error::{Error, Result};
use ndarray::{Array4, Axis};

/// ImageNet channel means (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Normalize each channel as `(x - mean) / std`.
///
/// Single-value statistics apply to every channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Normalize {
    /// Create a normalization with per-channel statistics.
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Self {
        Self { mean, std }
    }

    /// Normalization with ImageNet statistics.
    pub fn imagenet() -> Self {
        Self::new(IMAGENET_MEAN.to_vec(), IMAGENET_STD.to_vec())
    }

    /// Channel means
    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    /// Channel standard deviations
    pub fn std(&self) -> &[f32] {
        &self.std
    }
}

fn channel_stat(stats: &[f32], channel: usize) -> f32 {
    if stats.len() == 1 {
        stats[0]
    } else {
        stats[channel]
    }
}

impl Transform for Normalize {
    fn apply(&self, mut images: Array4<f32>) -> Result<Array4<f32>> {
        let channels = images.shape()[1];
        for stats in [&self.mean, &self.std] {
            if stats.len() != 1 && stats.len() != channels {
                return Err(Error::ShapeMismatch {
                    expected: vec![stats.len()],
                    actual: vec![channels],
                });
            }
        }
        if let Some(bad) = self.std.iter().find(|s| **s <= 0.0) {
            return Err(Error::config_value(
                "normalize.std",
                format!("standard deviation {bad} is not positive"),
                "Use strictly positive per-channel standard deviations",
            ));
        }

        for (ch, mut plane) in images.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std) = (channel_stat(&self.mean, ch), channel_stat(&self.std, ch));
            plane.mapv_inplace(|v| (v - mean) / std);
        }
        Ok(images)
    }

    fn name(&self) -> &'static str {
        "Normalize"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_imagenet_normalization() {
        let images = Array4::from_elem((1, 3, 1, 1), 0.485);
        let out = Normalize::imagenet().apply(images).expect("normalize");
        assert_abs_diff_eq!(out[[0, 0, 0, 0]], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out[[0, 1, 0, 0]], (0.485 - 0.456) / 0.224, epsilon = 1e-6);
        assert_abs_diff_eq!(out[[0, 2, 0, 0]], (0.485 - 0.406) / 0.225, epsilon = 1e-6);
    }

    #[test]
    fn test_channel_mismatch_is_shape_error() {
        let err = Normalize::imagenet()
            .apply(Array4::zeros((1, 1, 2, 2)))
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_single_value_stats_broadcast_over_channels() {
        let images = Array4::from_elem((2, 3, 2, 2), 1.0);
        let out = Normalize::new(vec![0.5], vec![0.25])
            .apply(images)
            .expect("normalize");
        assert_eq!(out.shape(), &[2, 3, 2, 2]);
        assert!(out.iter().all(|&v| (v - 2.0).abs() < 1e-6));

        let gray = Normalize::new(vec![0.5], vec![0.5])
            .apply(Array4::from_elem((1, 1, 1, 1), 0.0))
            .expect("normalize");
        assert_abs_diff_eq!(gray[[0, 0, 0, 0]], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_non_positive_std_rejected() {
        let err = Normalize::new(vec![0.0], vec![0.0])
            .apply(Array4::zeros((1, 1, 1, 1)))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigValue { .. }));
    }

    #[test]
    fn test_masks_untouched() {
        let mask = ndarray::Array3::from_elem((1, 2, 2), true);
        let out = Normalize::imagenet()
            .apply_mask(mask.clone())
            .expect("mask");
        assert_eq!(out, mask);
    }
}
