//! Batch data structures
//!
//! A [`Batch`] carries input images, optional ground truth and, once a step
//! has run, the model's predictions. An [`InferenceBatch`] carries the
//! predictions alone and is what the forward pipeline returns.

use ndarray::{Array1, Array3, Array4};
use std::path::PathBuf;

/// Field name of the input images.
pub const IMAGE: &str = "image";
/// Field name of the image-level ground truth.
pub const GT_LABEL: &str = "gt_label";
/// Field name of the pixel-level ground truth.
pub const GT_MASK: &str = "gt_mask";
/// Field name of the image-level anomaly score.
pub const PRED_SCORE: &str = "pred_score";
/// Field name of the image-level prediction.
pub const PRED_LABEL: &str = "pred_label";
/// Field name of the pixel-level anomaly map.
pub const ANOMALY_MAP: &str = "anomaly_map";
/// Field name of the pixel-level prediction.
pub const PRED_MASK: &str = "pred_mask";

/// Predictions produced by a model, optionally refined by a post-processor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceBatch {
    /// Image-level anomaly score, shape (N)
    pub pred_score: Option<Array1<f32>>,
    /// Image-level prediction, shape (N)
    pub pred_label: Option<Array1<bool>>,
    /// Pixel-level anomaly map, shape (N, H, W)
    pub anomaly_map: Option<Array3<f32>>,
    /// Pixel-level prediction, shape (N, H, W)
    pub pred_mask: Option<Array3<bool>>,
}

impl InferenceBatch {
    /// Predictions holding only image-level scores.
    pub fn from_scores(pred_score: Array1<f32>) -> Self {
        Self {
            pred_score: Some(pred_score),
            ..Default::default()
        }
    }

    /// Predictions holding an anomaly map and its per-image maximum as score.
    pub fn from_anomaly_map(anomaly_map: Array3<f32>) -> Self {
        let pred_score = anomaly_map
            .outer_iter()
            .map(|map| map.iter().copied().fold(f32::NEG_INFINITY, f32::max))
            .collect::<Array1<f32>>();
        Self {
            pred_score: Some(pred_score),
            anomaly_map: Some(anomaly_map),
            ..Default::default()
        }
    }

    /// Number of samples, taken from the first populated field.
    pub fn len(&self) -> usize {
        self.pred_score
            .as_ref()
            .map(Array1::len)
            .or_else(|| self.pred_label.as_ref().map(Array1::len))
            .or_else(|| self.anomaly_map.as_ref().map(|m| m.shape()[0]))
            .or_else(|| self.pred_mask.as_ref().map(|m| m.shape()[0]))
            .unwrap_or(0)
    }

    /// Check if the batch holds no predictions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One unit of input data, optionally with ground truth and predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Input images, shape (N, C, H, W)
    pub image: Array4<f32>,
    /// Image-level ground truth, shape (N)
    pub gt_label: Option<Array1<bool>>,
    /// Pixel-level ground truth, shape (N, H, W)
    pub gt_mask: Option<Array3<bool>>,
    /// Source paths of the images, if known
    pub image_path: Vec<PathBuf>,
    /// Image-level anomaly score, shape (N)
    pub pred_score: Option<Array1<f32>>,
    /// Image-level prediction, shape (N)
    pub pred_label: Option<Array1<bool>>,
    /// Pixel-level anomaly map, shape (N, H, W)
    pub anomaly_map: Option<Array3<f32>>,
    /// Pixel-level prediction, shape (N, H, W)
    pub pred_mask: Option<Array3<bool>>,
}

impl Batch {
    /// Create a batch from images only.
    pub fn new(image: Array4<f32>) -> Self {
        Self {
            image,
            gt_label: None,
            gt_mask: None,
            image_path: Vec::new(),
            pred_score: None,
            pred_label: None,
            anomaly_map: None,
            pred_mask: None,
        }
    }

    /// Attach image-level ground truth.
    pub fn with_labels(mut self, gt_label: Array1<bool>) -> Self {
        self.gt_label = Some(gt_label);
        self
    }

    /// Attach pixel-level ground truth.
    pub fn with_masks(mut self, gt_mask: Array3<bool>) -> Self {
        self.gt_mask = Some(gt_mask);
        self
    }

    /// Attach source paths.
    pub fn with_paths(mut self, image_path: Vec<PathBuf>) -> Self {
        self.image_path = image_path;
        self
    }

    /// Get batch size (first image dimension).
    pub fn size(&self) -> usize {
        self.image.shape()[0]
    }

    /// Merge predictions into the batch. Absent prediction fields are left untouched.
    pub fn update(&mut self, predictions: InferenceBatch) {
        let InferenceBatch {
            pred_score,
            pred_label,
            anomaly_map,
            pred_mask,
        } = predictions;
        if pred_score.is_some() {
            self.pred_score = pred_score;
        }
        if pred_label.is_some() {
            self.pred_label = pred_label;
        }
        if anomaly_map.is_some() {
            self.anomaly_map = anomaly_map;
        }
        if pred_mask.is_some() {
            self.pred_mask = pred_mask;
        }
    }

    /// Consume the batch and keep only its predictions.
    pub fn into_predictions(self) -> InferenceBatch {
        InferenceBatch {
            pred_score: self.pred_score,
            pred_label: self.pred_label,
            anomaly_map: self.anomaly_map,
            pred_mask: self.pred_mask,
        }
    }

    /// Copy out the predictions currently held by the batch.
    pub fn predictions(&self) -> InferenceBatch {
        InferenceBatch {
            pred_score: self.pred_score.clone(),
            pred_label: self.pred_label.clone(),
            anomaly_map: self.anomaly_map.clone(),
            pred_mask: self.pred_mask.clone(),
        }
    }

    /// Check whether the named field is populated.
    pub fn has_field(&self, name: &str) -> bool {
        match name {
            IMAGE => true,
            GT_LABEL => self.gt_label.is_some(),
            GT_MASK => self.gt_mask.is_some(),
            PRED_SCORE => self.pred_score.is_some(),
            PRED_LABEL => self.pred_label.is_some(),
            ANOMALY_MAP => self.anomaly_map.is_some(),
            PRED_MASK => self.pred_mask.is_some(),
            "image_path" => !self.image_path.is_empty(),
            _ => false,
        }
    }
}
