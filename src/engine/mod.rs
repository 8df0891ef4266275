//! Minimal engine driving the module lifecycle
//!
//! The engine runs sequential loops over in-memory batches. Each loop calls
//! `setup`, then per batch:
//!
//! 1. `on_batch_start` of the module's components and the user callbacks
//! 2. the module step for the loop
//! 3. `on_batch_end` with the step output
//!
//! and finally `on_epoch_end`.
//!
//! # Example
//!
//! ```no_run
//! use anomalo::engine::Engine;
//! use anomalo::models::PixelStats;
//! use anomalo::module::ModulePipeline;
//! # let train: Vec<anomalo::data::Batch> = vec![];
//! # let test: Vec<anomalo::data::Batch> = vec![];
//!
//! let mut pipeline = ModulePipeline::new(PixelStats::default())?;
//! let mut engine = Engine::default();
//! engine.fit(&mut pipeline, &train, &[])?;
//! let predictions = engine.test(&mut pipeline, &test)?;
//! # Ok::<(), anomalo::Error>(())
//! ```

mod result;
mod runner;


pub use result::FitResult;
pub use runner::Engine;
