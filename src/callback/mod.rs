//! Callback system for pipeline components
//!
//! Components bracketing the model hook into the trainer lifecycle:
//! - `on_setup`
//! - `on_batch_start` / `on_batch_end`
//! - `on_epoch_end`
//!
//! # Example
//!
//! ```rust
//! use anomalo::callback::{ComponentCallback, Stage};
//! use anomalo::data::Batch;
//! use anomalo::Result;
//!
//! struct CountBatches(usize);
//!
//! impl ComponentCallback for CountBatches {
//!     fn on_batch_end(&mut self, _stage: Stage, _outputs: &mut Batch) -> Result<()> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//! ```

mod manager;
mod traits;

pub use manager::CallbackManager;
pub use traits::{Component, ComponentCallback, ComponentSlot, Stage, TrainerFn};
