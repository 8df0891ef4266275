//! Per-pixel Gaussian statistics model
//!
//! Training accumulates, for every pixel position, the mean and standard
//! deviation of the channel-averaged intensity of normal images. The anomaly
//! map of an image is its per-pixel z-score against those statistics and the
//! image score is the maximum of the map.

use crate::data::{Batch, InferenceBatch};
use crate::error::{Error, Result};
use crate::learning_type::LearningType;
use crate::module::{AnomalyModel, SetupContext, TrainerArguments};
use ndarray::{Array2, Array3, Array4, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Constructor arguments of [`PixelStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelStatsConfig {
    /// Added to the standard deviation before dividing
    #[serde(default = "default_eps")]
    pub eps: f32,
}

impl Default for PixelStatsConfig {
    fn default() -> Self {
        Self { eps: default_eps() }
    }
}

fn default_eps() -> f32 {
    1e-3
}

#[derive(Debug, Clone)]
struct Accumulator {
    count: usize,
    sum: Array2<f64>,
    sum_sq: Array2<f64>,
}

#[derive(Debug, Clone)]
struct Statistics {
    mean: Array2<f32>,
    std: Array2<f32>,
}

/// One-class model scoring pixels by their deviation from training statistics.
#[derive(Debug, Clone, Default)]
pub struct PixelStats {
    config: PixelStatsConfig,
    accumulator: Option<Accumulator>,
    statistics: Option<Statistics>,
}

impl PixelStats {
    /// Create an untrained model.
    pub fn new(config: PixelStatsConfig) -> Self {
        Self {
            config,
            accumulator: None,
            statistics: None,
        }
    }

    /// Build from configuration `init_args`. `null` yields the defaults.
    pub fn from_init_args(init_args: &serde_yaml::Value) -> Result<Self> {
        if init_args.is_null() {
            return Ok(Self::default());
        }
        let config: PixelStatsConfig = serde_yaml::from_value(init_args.clone())?;
        if config.eps.is_nan() || config.eps <= 0.0 {
            return Err(Error::config_value(
                "model.init_args.eps",
                format!("must be positive, got {}", config.eps),
                "Use a small positive value such as 0.001",
            ));
        }
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &PixelStatsConfig {
        &self.config
    }

    /// Whether statistics have been computed
    pub fn is_fitted(&self) -> bool {
        self.statistics.is_some()
    }

    /// Spatial size the model was set up for
    pub fn image_size(&self) -> Option<(usize, usize)> {
        self.accumulator
            .as_ref()
            .map(|a| a.sum.dim())
            .or_else(|| self.statistics.as_ref().map(|s| s.mean.dim()))
    }

    fn channel_mean(images: &Array4<f32>) -> Result<Array3<f32>> {
        images
            .mean_axis(Axis(1))
            .ok_or_else(|| Error::ShapeMismatch {
                expected: vec![images.shape()[0], 1, images.shape()[2], images.shape()[3]],
                actual: images.shape().to_vec(),
            })
    }

    fn check_size(expected: (usize, usize), images: &Array3<f32>) -> Result<()> {
        let (n, h, w) = images.dim();
        if (h, w) != expected {
            return Err(Error::ShapeMismatch {
                expected: vec![n, expected.0, expected.1],
                actual: vec![n, h, w],
            });
        }
        Ok(())
    }
}

impl AnomalyModel for PixelStats {
    fn name(&self) -> &str {
        "PixelStats"
    }

    fn learning_type(&self) -> LearningType {
        LearningType::OneClass
    }

    fn trainer_arguments(&self) -> TrainerArguments {
        TrainerArguments {
            max_epochs: Some(1),
            num_sanity_val_steps: Some(0),
            ..Default::default()
        }
    }

    fn is_built(&self) -> bool {
        self.accumulator.is_some() || self.statistics.is_some()
    }

    fn setup(&mut self, ctx: &SetupContext) -> Result<()> {
        let Some((height, width)) = ctx.input_size else {
            return Err(Error::config_value(
                "pre_processor",
                "PixelStats needs a fixed input size",
                "Enable the default pre-processor or add a Resize transform",
            ));
        };
        tracing::debug!(height, width, "allocating pixel statistics");
        self.accumulator = Some(Accumulator {
            count: 0,
            sum: Array2::zeros((height, width)),
            sum_sq: Array2::zeros((height, width)),
        });
        Ok(())
    }

    fn forward(&self, images: &Array4<f32>) -> Result<InferenceBatch> {
        let stats = self
            .statistics
            .as_ref()
            .ok_or_else(|| Error::ModelNotReady {
                name: "PixelStats".into(),
                message: "statistics have not been computed".into(),
            })?;
        let intensity = Self::channel_mean(images)?;
        Self::check_size(stats.mean.dim(), &intensity)?;

        let eps = self.config.eps;
        let mut map = intensity;
        for mut image in map.outer_iter_mut() {
            Zip::from(&mut image)
                .and(&stats.mean)
                .and(&stats.std)
                .for_each(|x, &m, &s| {
                    *x = (*x - m).abs() / (s + eps);
                });
        }
        Ok(InferenceBatch::from_anomaly_map(map))
    }

    fn training_step(&mut self, batch: &Batch, _batch_idx: usize) -> Result<Option<f32>> {
        let accumulator = self
            .accumulator
            .as_mut()
            .ok_or_else(|| Error::ModelNotReady {
                name: "PixelStats".into(),
                message: "setup() has not been called".into(),
            })?;
        let intensity = Self::channel_mean(&batch.image)?;
        Self::check_size(accumulator.sum.dim(), &intensity)?;

        for image in intensity.outer_iter() {
            Zip::from(&mut accumulator.sum)
                .and(&mut accumulator.sum_sq)
                .and(&image)
                .for_each(|sum, sum_sq, &x| {
                    let x = f64::from(x);
                    *sum += x;
                    *sum_sq += x * x;
                });
            accumulator.count += 1;
        }
        Ok(None)
    }

    fn on_train_epoch_end(&mut self) -> Result<()> {
        let Some(accumulator) = self.accumulator.as_ref() else {
            return Ok(());
        };
        if accumulator.count == 0 {
            return Err(Error::ModelNotReady {
                name: "PixelStats".into(),
                message: "no training images were seen".into(),
            });
        }
        let count = accumulator.count as f64;
        let mean = accumulator.sum.mapv(|s| s / count);
        let mut std = Array2::<f32>::zeros(mean.raw_dim());
        Zip::from(&mut std)
            .and(&accumulator.sum_sq)
            .and(&mean)
            .for_each(|sd, &sq, &m| {
                *sd = (sq / count - m * m).max(0.0).sqrt() as f32;
            });
        tracing::info!(images = accumulator.count, "pixel statistics computed");
        self.statistics = Some(Statistics {
            mean: mean.mapv(|m| m as f32),
            std,
        });
        Ok(())
    }

    fn validation_step(&mut self, mut batch: Batch, _batch_idx: usize) -> Result<Batch> {
        let predictions = self.forward(&batch.image)?;
        batch.update(predictions);
        Ok(batch)
    }

    fn init_args(&self) -> serde_yaml::Value {
        serde_yaml::to_value(&self.config).unwrap_or(serde_yaml::Value::Null)
    }
}
