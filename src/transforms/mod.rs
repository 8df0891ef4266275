//! Image transforms used by the pre-processor
//!
//! Transforms operate on `(N, C, H, W)` image tensors. Geometric transforms
//! also apply to `(N, H, W)` masks so ground truth stays aligned with the
//! images it belongs to.

mod normalize;
mod resize;

pub use normalize::{Normalize, IMAGENET_MEAN, IMAGENET_STD};
pub use resize::Resize;

use crate::error::Result;
use ndarray::{Array3, Array4};
use std::fmt;
use std::sync::Arc;

/// A transform over a batch of images.
pub trait Transform: Send + Sync + fmt::Debug {
    /// Transform a batch of images.
    fn apply(&self, images: Array4<f32>) -> Result<Array4<f32>>;

    /// Transform a batch of masks. Non-geometric transforms leave masks as they are.
    fn apply_mask(&self, mask: Array3<bool>) -> Result<Array3<bool>> {
        Ok(mask)
    }

    /// Get transform name for logging
    fn name(&self) -> &'static str;
}

/// Sequential composition of transforms.
#[derive(Debug, Clone, Default)]
pub struct Compose {
    transforms: Vec<Arc<dyn Transform>>,
}

impl Compose {
    /// Create an empty composition (identity).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform.
    pub fn then<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    /// Number of composed transforms
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if the composition is the identity
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Names of the composed transforms, in application order
    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl Transform for Compose {
    fn apply(&self, images: Array4<f32>) -> Result<Array4<f32>> {
        self.transforms
            .iter()
            .try_fold(images, |acc, t| t.apply(acc))
    }

    fn apply_mask(&self, mask: Array3<bool>) -> Result<Array3<bool>> {
        self.transforms
            .iter()
            .try_fold(mask, |acc, t| t.apply_mask(acc))
    }

    fn name(&self) -> &'static str {
        "Compose"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn test_empty_compose_is_identity() {
        let images = Array4::from_elem((1, 3, 2, 2), 0.5f32);
        let out = Compose::new().apply(images.clone()).expect("identity");
        assert_eq!(out, images);
    }

    #[test]
    fn test_compose_applies_in_order() {
        let compose = Compose::new()
            .then(Resize::new(4, 6))
            .then(Normalize::new(vec![0.5], vec![0.5]));
        assert_eq!(compose.names(), vec!["Resize", "Normalize"]);

        let out = compose
            .apply(Array4::from_elem((2, 1, 2, 2), 1.0))
            .expect("apply");
        assert_eq!(out.shape(), &[2, 1, 4, 6]);
        assert!(out.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_compose_masks_follow_geometry() {
        let compose = Compose::new()
            .then(Normalize::new(vec![0.0], vec![1.0]))
            .then(Resize::new(4, 4));
        let mask = ndarray::Array3::from_elem((1, 2, 2), true);
        let out = compose.apply_mask(mask).expect("mask");
        assert_eq!(out.shape(), &[1, 4, 4]);
    }
}
