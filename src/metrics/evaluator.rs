//! Evaluator component
//!
//! Holds the metric declarations of a module and tracks, per loop, which
//! metrics received the batch fields they need. Metric values themselves are
//! computed by downstream tooling.

use super::{MetricKind, MetricSpec};
use crate::callback::{Component, ComponentCallback, Stage};
use crate::data::Batch;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-metric bookkeeping for one loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricState {
    /// Batches that carried every required field
    pub updates: usize,
    /// Samples seen across those batches
    pub samples: usize,
    /// Batches missing at least one required field
    pub skipped: usize,
}

/// Summary emitted at the end of a validation or test loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    /// Loop the summary belongs to
    pub stage: Stage,
    /// Metric name to bookkeeping
    pub metrics: BTreeMap<String, MetricState>,
}

impl EvaluationSummary {
    /// Metrics that never received their fields.
    pub fn unfed_metrics(&self) -> Vec<&str> {
        self.metrics
            .iter()
            .filter(|(_, s)| s.updates == 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Metric declarations for validation and test loops.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    val_metrics: Vec<MetricSpec>,
    test_metrics: Vec<MetricSpec>,
    state: BTreeMap<String, MetricState>,
    last_summary: Option<EvaluationSummary>,
}

impl Evaluator {
    /// Create an evaluator with validation and test metrics.
    pub fn new(val_metrics: Vec<MetricSpec>, test_metrics: Vec<MetricSpec>) -> Self {
        Self {
            val_metrics,
            test_metrics,
            ..Self::default()
        }
    }

    /// Evaluator that only declares test metrics.
    pub fn with_test_metrics(test_metrics: Vec<MetricSpec>) -> Self {
        Self::new(Vec::new(), test_metrics)
    }

    /// Validation metrics
    pub fn val_metrics(&self) -> &[MetricSpec] {
        &self.val_metrics
    }

    /// Test metrics
    pub fn test_metrics(&self) -> &[MetricSpec] {
        &self.test_metrics
    }

    /// Summary of the most recently finished loop
    pub fn last_summary(&self) -> Option<&EvaluationSummary> {
        self.last_summary.as_ref()
    }

    fn metrics_for(&self, stage: Stage) -> &[MetricSpec] {
        match stage {
            Stage::Validation => &self.val_metrics,
            Stage::Test => &self.test_metrics,
            Stage::Train | Stage::Predict => &[],
        }
    }
}

impl Component for Evaluator {
    fn as_callback(&mut self) -> Option<&mut dyn ComponentCallback> {
        Some(self)
    }
}

impl ComponentCallback for Evaluator {
    fn on_batch_end(&mut self, stage: Stage, outputs: &mut Batch) -> Result<()> {
        let metrics = match stage {
            Stage::Validation => &self.val_metrics,
            Stage::Test => &self.test_metrics,
            Stage::Train | Stage::Predict => return Ok(()),
        };
        for metric in metrics {
            let state = self.state.entry(metric.name()).or_default();
            if metric.fields.iter().all(|f| outputs.has_field(f)) {
                state.updates += 1;
                state.samples += outputs.size();
            } else {
                state.skipped += 1;
            }
        }
        Ok(())
    }

    fn on_epoch_end(&mut self, stage: Stage) -> Result<()> {
        if self.metrics_for(stage).is_empty() {
            return Ok(());
        }
        let mut metrics = std::mem::take(&mut self.state);
        for metric in self.metrics_for(stage) {
            metrics.entry(metric.name()).or_default();
        }
        let summary = EvaluationSummary { stage, metrics };
        for name in summary.unfed_metrics() {
            tracing::warn!(
                metric = name,
                %stage,
                "metric received no batch with its required fields"
            );
        }
        tracing::info!(%stage, metrics = summary.metrics.len(), "evaluation loop finished");
        self.last_summary = Some(summary);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Evaluator"
    }
}

/// Declarative form of an [`Evaluator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Metrics tracked during validation
    #[serde(default)]
    pub val_metrics: Vec<MetricSpec>,
    /// Metrics tracked during testing
    #[serde(default = "default_test_metrics")]
    pub test_metrics: Vec<MetricSpec>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            val_metrics: Vec::new(),
            test_metrics: default_test_metrics(),
        }
    }
}

fn default_test_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::image(MetricKind::Auroc),
        MetricSpec::image(MetricKind::F1Score),
        MetricSpec::pixel(MetricKind::Auroc),
        MetricSpec::pixel(MetricKind::F1Score),
    ]
}

impl EvaluatorConfig {
    /// Build the evaluator this configuration describes.
    pub fn build(&self) -> Evaluator {
        Evaluator::new(self.val_metrics.clone(), self.test_metrics.clone())
    }
}
