//! Component slots read from `model.init_args`

use crate::callback::ComponentSlot;
use crate::error::{Error, Result};
use crate::metrics::{Evaluator, EvaluatorConfig, MetricsConfig};
use crate::module::{AnomalyModel, ComponentArg, ModulePipelineBuilder};
use crate::post_processing::{OneClassPostProcessor, OneClassPostProcessorConfig, PostProcessor};
use crate::pre_processing::{PreProcessor, PreProcessorConfig};
use crate::visualization::{ImageVisualizerConfig, Visualizer};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

const SUPPORTED_THRESHOLD: &str = "F1AdaptiveThreshold";

/// The four slot arguments of a configured pipeline.
#[derive(Debug, Default)]
pub struct ComponentArgs {
    pub pre_processor: ComponentArg<PreProcessor>,
    pub post_processor: ComponentArg<Box<dyn PostProcessor>>,
    pub evaluator: ComponentArg<Evaluator>,
    pub visualizer: ComponentArg<Box<dyn Visualizer>>,
}

fn parse_section<T: DeserializeOwned>(slot: ComponentSlot, value: &Value) -> Result<T> {
    serde_yaml::from_value(value.clone()).map_err(|e| {
        Error::config_value(
            format!("model.init_args.{}", slot.config_key()),
            e.to_string(),
            format!("Use true, false or a valid {slot} mapping"),
        )
    })
}

impl ComponentArgs {
    /// Remove the slot keys from `init_args` and interpret them.
    ///
    /// Missing keys mean `true`. When a `metrics` section is given and the
    /// evaluator slot is left at its default, the evaluator is built from
    /// that section.
    pub fn take_from(init_args: &mut Mapping, metrics: Option<&MetricsConfig>) -> Result<Self> {
        let mut take = |slot: ComponentSlot| init_args.remove(slot.config_key());

        let pre_processor = match take(ComponentSlot::PreProcessor) {
            Some(value) => ComponentArg::from_value(ComponentSlot::PreProcessor, &value, |v| {
                let config: PreProcessorConfig = parse_section(ComponentSlot::PreProcessor, v)?;
                config.build()
            })?,
            None => ComponentArg::default(),
        };

        let post_processor = match take(ComponentSlot::PostProcessor) {
            Some(value) => ComponentArg::from_value(ComponentSlot::PostProcessor, &value, |v| {
                let config: OneClassPostProcessorConfig =
                    parse_section(ComponentSlot::PostProcessor, v)?;
                let post_processor: Box<dyn PostProcessor> =
                    Box::new(OneClassPostProcessor::new(config));
                Ok(post_processor)
            })?,
            None => ComponentArg::default(),
        };

        let evaluator = match take(ComponentSlot::Evaluator) {
            Some(value) => ComponentArg::from_value(ComponentSlot::Evaluator, &value, |v| {
                let config: EvaluatorConfig = parse_section(ComponentSlot::Evaluator, v)?;
                Ok(config.build())
            })?,
            None => ComponentArg::default(),
        };

        let visualizer = match take(ComponentSlot::Visualizer) {
            Some(value) => ComponentArg::from_value(ComponentSlot::Visualizer, &value, |v| {
                let config: ImageVisualizerConfig = parse_section(ComponentSlot::Visualizer, v)?;
                Ok(Box::new(config.build()) as Box<dyn Visualizer>)
            })?,
            None => ComponentArg::default(),
        };

        let mut args = Self {
            pre_processor,
            post_processor,
            evaluator,
            visualizer,
        };
        if let Some(metrics) = metrics {
            args.apply_metrics(metrics)?;
        }
        Ok(args)
    }

    fn apply_metrics(&mut self, metrics: &MetricsConfig) -> Result<()> {
        if metrics.threshold != SUPPORTED_THRESHOLD {
            return Err(Error::config_value(
                "metrics.threshold",
                format!("unsupported thresholding method '{}'", metrics.threshold),
                format!("Use {SUPPORTED_THRESHOLD}"),
            ));
        }
        if matches!(self.evaluator, ComponentArg::Flag(true)) {
            tracing::debug!("building evaluator from the metrics section");
            self.evaluator = ComponentArg::Instance(metrics.to_evaluator());
        }
        Ok(())
    }

    /// Hand the slot arguments to a pipeline builder.
    pub fn apply<M: AnomalyModel>(
        self,
        builder: ModulePipelineBuilder<M>,
    ) -> ModulePipelineBuilder<M> {
        builder
            .pre_processor(self.pre_processor)
            .post_processor(self.post_processor)
            .evaluator(self.evaluator)
            .visualizer(self.visualizer)
    }
}
