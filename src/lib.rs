//! # Anomalo
//!
//! Anomaly-detection module pipelines: a model wrapped together with its
//! pre-processor, post-processor, evaluator and visualizer.
//!
//! - [`module`]: the [`ModulePipeline`] and the [`AnomalyModule`] lifecycle
//!   a training loop drives
//! - [`pre_processing`], [`post_processing`], [`metrics`], [`visualization`]:
//!   the four component slots
//! - [`config`]: building pipelines from YAML files through a
//!   [`config::ModelRegistry`]
//! - [`engine`]: a sequential driver for fit/validate/test/predict loops
//!
//! # Example
//!
//! ```no_run
//! use anomalo::models::PixelStats;
//! use anomalo::{AnomalyModule, ModulePipeline};
//! use ndarray::Array4;
//!
//! let pipeline = ModulePipeline::builder(PixelStats::default())
//!     .evaluator(false)
//!     .build()?;
//! let predictions = pipeline.forward(Array4::zeros((1, 3, 64, 64)))?;
//! # Ok::<(), anomalo::Error>(())
//! ```

pub mod callback;
pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod learning_type;
pub mod metrics;
pub mod models;
pub mod module;
pub mod post_processing;
pub mod pre_processing;
pub mod transforms;
pub mod visualization;

pub use callback::{Component, ComponentCallback, ComponentSlot, Stage, TrainerFn};
pub use data::{Batch, InferenceBatch};
pub use error::{Error, ErrorKind, Result};
pub use learning_type::LearningType;
pub use module::{
    AnomalyModel, AnomalyModule, ComponentArg, ModuleHparams, ModulePipeline, SlotResolution,
    TrainerArguments,
};
