//! Metric declarations and the evaluator component

mod evaluator;

pub use evaluator::{EvaluationSummary, Evaluator, EvaluatorConfig, MetricState};

use crate::data::{ANOMALY_MAP, GT_LABEL, GT_MASK, PRED_LABEL, PRED_MASK, PRED_SCORE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metric families understood by the evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Area under the ROC curve, fed with continuous scores
    #[serde(rename = "AUROC")]
    Auroc,
    /// F1 score, fed with binary predictions
    #[serde(rename = "F1Score")]
    F1Score,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auroc => f.write_str("AUROC"),
            Self::F1Score => f.write_str("F1Score"),
        }
    }
}

/// A metric bound to the batch fields it consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Metric family
    pub kind: MetricKind,
    /// Prediction field followed by ground-truth field
    pub fields: Vec<String>,
    /// Prefix of the reported name, e.g. `image_`
    #[serde(default)]
    pub prefix: String,
}

impl MetricSpec {
    /// Image-level metric over scores/labels.
    pub fn image(kind: MetricKind) -> Self {
        let pred = match kind {
            MetricKind::Auroc => PRED_SCORE,
            MetricKind::F1Score => PRED_LABEL,
        };
        Self {
            kind,
            fields: vec![pred.to_string(), GT_LABEL.to_string()],
            prefix: "image_".into(),
        }
    }

    /// Pixel-level metric over maps/masks.
    pub fn pixel(kind: MetricKind) -> Self {
        let pred = match kind {
            MetricKind::Auroc => ANOMALY_MAP,
            MetricKind::F1Score => PRED_MASK,
        };
        Self {
            kind,
            fields: vec![pred.to_string(), GT_MASK.to_string()],
            prefix: "pixel_".into(),
        }
    }

    /// Reported metric name
    pub fn name(&self) -> String {
        format!("{}{}", self.prefix, self.kind)
    }
}

/// Top-level `metrics` section of a module configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Image-level metrics
    #[serde(default = "default_image_metrics")]
    pub image: Option<Vec<MetricKind>>,
    /// Pixel-level metrics
    #[serde(default)]
    pub pixel: Option<Vec<MetricKind>>,
    /// Thresholding method of the post-processor
    #[serde(default = "default_threshold")]
    pub threshold: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            image: default_image_metrics(),
            pixel: None,
            threshold: default_threshold(),
        }
    }
}

fn default_image_metrics() -> Option<Vec<MetricKind>> {
    Some(vec![MetricKind::F1Score, MetricKind::Auroc])
}

fn default_threshold() -> String {
    "F1AdaptiveThreshold".to_string()
}

impl MetricsConfig {
    /// Test-metric declarations for this section.
    pub fn test_metrics(&self) -> Vec<MetricSpec> {
        let image = self.image.iter().flatten().map(|k| MetricSpec::image(*k));
        let pixel = self.pixel.iter().flatten().map(|k| MetricSpec::pixel(*k));
        image.chain(pixel).collect()
    }

    /// Evaluator declaring this section's metrics for testing.
    pub fn to_evaluator(&self) -> Evaluator {
        Evaluator::with_test_metrics(self.test_metrics())
    }
}
