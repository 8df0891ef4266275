//! Module pipeline
//!
//! A [`ModulePipeline`] wraps an [`AnomalyModel`] with up to four components:
//! pre-processor, post-processor, evaluator and visualizer. Each slot is
//! resolved at construction from a [`ComponentArg`]:
//!
//! - `true` builds the model's default for that slot,
//! - `false` leaves the slot empty,
//! - an instance is used as-is.
//!
//! The pipeline brackets the model's forward pass with the pre- and
//! post-processor and exposes the components to the engine as lifecycle
//! callbacks.

mod hparams;
mod model;
mod pipeline;
mod resolve;
mod trainer_args;


pub use hparams::ModuleHparams;
pub use model::{AnomalyModel, SetupContext};
pub use pipeline::{AnomalyModule, ModulePipeline, ModulePipelineBuilder};
pub use resolve::{value_type_name, ComponentArg, SlotResolution};
pub use trainer_args::TrainerArguments;
