//! Visualization of predictions
//!
//! A [`Visualizer`] observes test and predict batches. The built-in
//! [`ImageVisualizer`] queues one [`VisualizationItem`] per image describing
//! which panels can be drawn; rendering the panels is left to the consumer
//! draining the queue.

use crate::callback::{Component, ComponentCallback, Stage, TrainerFn};
use crate::data::{Batch, ANOMALY_MAP, GT_MASK, IMAGE, PRED_MASK};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Produces diagnostic output from pipeline results.
pub trait Visualizer: Component {
    /// Get visualizer name for logging
    fn name(&self) -> &'static str;

    /// Take the items queued since the last call.
    fn drain_items(&mut self) -> Vec<VisualizationItem> {
        Vec::new()
    }
}

/// A base field with fields drawn on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    /// Field used as background
    pub base: String,
    /// Fields blended over the background
    pub overlays: Vec<String>,
}

/// Declarative form of [`ImageVisualizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageVisualizerConfig {
    /// Fields drawn as standalone panels
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    /// Overlay panels
    #[serde(default = "default_overlays")]
    pub overlay_fields: Vec<Overlay>,
    /// Directory rendered panels are written to
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for ImageVisualizerConfig {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            overlay_fields: default_overlays(),
            output_dir: None,
        }
    }
}

fn default_fields() -> Vec<String> {
    vec![IMAGE.to_string(), GT_MASK.to_string()]
}

fn default_overlays() -> Vec<Overlay> {
    vec![
        Overlay {
            base: IMAGE.to_string(),
            overlays: vec![ANOMALY_MAP.to_string()],
        },
        Overlay {
            base: IMAGE.to_string(),
            overlays: vec![PRED_MASK.to_string()],
        },
    ]
}

impl ImageVisualizerConfig {
    /// Build the visualizer this configuration describes.
    pub fn build(&self) -> ImageVisualizer {
        ImageVisualizer::new(self.clone())
    }
}

/// Description of the panels available for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationItem {
    /// Loop that produced the image
    pub stage: Stage,
    /// Position of the image within its batch
    pub index: usize,
    /// Source path, when the batch carried one
    pub image_path: Option<PathBuf>,
    /// Standalone panels whose field is populated
    pub fields: Vec<String>,
    /// Overlay panels whose fields are all populated
    pub overlays: Vec<Overlay>,
    /// Image-level score, when available
    pub pred_score: Option<f32>,
    /// Image-level prediction, when available
    pub pred_label: Option<bool>,
}

/// Default visualizer queueing per-image panel descriptions.
///
/// The queue holds the items of the latest test or predict loop; starting
/// another loop discards anything not drained.
#[derive(Debug, Clone, Default)]
pub struct ImageVisualizer {
    config: ImageVisualizerConfig,
    items: Vec<VisualizationItem>,
}

impl ImageVisualizer {
    /// Create a visualizer from its configuration.
    pub fn new(config: ImageVisualizerConfig) -> Self {
        Self {
            config,
            items: Vec::new(),
        }
    }

    /// Configuration this visualizer was built from
    pub fn config(&self) -> &ImageVisualizerConfig {
        &self.config
    }

    /// Number of queued items
    pub fn pending(&self) -> usize {
        self.items.len()
    }
}

impl Visualizer for ImageVisualizer {
    fn name(&self) -> &'static str {
        "ImageVisualizer"
    }

    fn drain_items(&mut self) -> Vec<VisualizationItem> {
        std::mem::take(&mut self.items)
    }
}

impl Component for ImageVisualizer {
    fn as_callback(&mut self) -> Option<&mut dyn ComponentCallback> {
        Some(self)
    }
}

impl ComponentCallback for ImageVisualizer {
    fn on_setup(&mut self, trainer_fn: TrainerFn) -> Result<()> {
        if !self.items.is_empty() {
            tracing::debug!(
                ?trainer_fn,
                dropped = self.items.len(),
                "discarding undrained visualization items"
            );
            self.items.clear();
        }
        Ok(())
    }

    fn on_batch_end(&mut self, stage: Stage, outputs: &mut Batch) -> Result<()> {
        if !matches!(stage, Stage::Test | Stage::Predict) {
            return Ok(());
        }
        let fields: Vec<String> = self
            .config
            .fields
            .iter()
            .filter(|f| outputs.has_field(f))
            .cloned()
            .collect();
        let overlays: Vec<Overlay> = self
            .config
            .overlay_fields
            .iter()
            .filter(|o| {
                outputs.has_field(&o.base) && o.overlays.iter().all(|f| outputs.has_field(f))
            })
            .cloned()
            .collect();

        let scores = outputs.pred_score.as_ref();
        let labels = outputs.pred_label.as_ref();
        for index in 0..outputs.size() {
            self.items.push(VisualizationItem {
                stage,
                index,
                image_path: outputs.image_path.get(index).cloned(),
                fields: fields.clone(),
                overlays: overlays.clone(),
                pred_score: scores.and_then(|s| s.get(index).copied()),
                pred_label: labels.and_then(|l| l.get(index).copied()),
            });
        }
        tracing::debug!(%stage, queued = self.items.len(), "visualization items queued");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ImageVisualizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InferenceBatch;
    use ndarray::{array, Array3, Array4};

    #[test]
    fn test_queues_one_item_per_image() {
        let mut visualizer = ImageVisualizerConfig::default().build();
        let mut batch = Batch::new(Array4::zeros((2, 3, 2, 2)))
            .with_paths(vec!["a.png".into(), "b.png".into()]);
        batch.update(InferenceBatch {
            pred_score: Some(array![0.2, 0.8]),
            anomaly_map: Some(Array3::zeros((2, 2, 2))),
            ..Default::default()
        });

        visualizer
            .on_batch_end(Stage::Test, &mut batch)
            .expect("queue");
        let items = visualizer.drain_items();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].image_path, Some(PathBuf::from("b.png")));
        assert_eq!(items[1].pred_score, Some(0.8));
        assert_eq!(items[0].fields, vec!["image"]);
        assert_eq!(items[0].overlays.len(), 1);
        assert_eq!(items[0].overlays[0].overlays, vec!["anomaly_map"]);
        assert_eq!(visualizer.pending(), 0);
    }

    #[test]
    fn test_new_loop_discards_undrained_items() {
        let mut visualizer = ImageVisualizer::default();
        let mut batch = Batch::new(Array4::zeros((3, 1, 1, 1)));
        visualizer
            .on_batch_end(Stage::Predict, &mut batch)
            .expect("queue");
        assert_eq!(visualizer.pending(), 3);

        visualizer.on_setup(TrainerFn::Predict).expect("setup");
        assert_eq!(visualizer.pending(), 0);
    }

    #[test]
    fn test_validation_batches_are_ignored() {
        let mut visualizer = ImageVisualizer::default();
        let mut batch = Batch::new(Array4::zeros((1, 1, 1, 1)));
        visualizer
            .on_batch_end(Stage::Validation, &mut batch)
            .expect("noop");
        assert_eq!(visualizer.pending(), 0);
    }

    #[test]
    fn test_config_defaults_from_yaml() {
        let config: ImageVisualizerConfig =
            serde_yaml::from_str("output_dir: ./results").expect("parse");
        assert_eq!(config.fields, vec!["image", "gt_mask"]);
        assert_eq!(config.overlay_fields.len(), 2);
        assert_eq!(config.output_dir, Some(PathBuf::from("./results")));
    }
}
