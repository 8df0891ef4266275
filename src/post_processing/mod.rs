//! Post-processing of model predictions
//!
//! A post-processor refines raw model output: normalising scores and
//! deriving binary predictions. [`OneClassPostProcessor`] is the built-in
//! implementation for one-class models.

mod one_class;
mod threshold;

pub use one_class::{OneClassPostProcessor, OneClassPostProcessorConfig};
pub use threshold::f1_adaptive_threshold;

use crate::callback::Component;
use crate::data::InferenceBatch;
use crate::error::Result;

/// Refines model predictions at the end of the forward pipeline.
pub trait PostProcessor: Component {
    /// Post-process raw model predictions
    fn forward(&self, predictions: InferenceBatch) -> Result<InferenceBatch>;

    /// Get post-processor name for logging
    fn name(&self) -> &'static str;
}
