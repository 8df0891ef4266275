//! Callback manager for dispatching events to multiple callbacks

use super::traits::{ComponentCallback, Stage, TrainerFn};
use crate::data::Batch;
use crate::error::Result;

/// Manages trainer-level callbacks and dispatches events in registration order.
///
/// The first failing callback aborts the dispatch and its error is returned.
pub struct CallbackManager {
    callbacks: Vec<Box<dyn ComponentCallback>>,
}

impl CallbackManager {
    /// Create new callback manager
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a callback
    pub fn add<C: ComponentCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    /// Check if no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Get number of callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Names of registered callbacks
    pub fn names(&self) -> Vec<&'static str> {
        self.callbacks.iter().map(|cb| cb.name()).collect()
    }

    /// Fire setup event
    pub fn on_setup(&mut self, trainer_fn: TrainerFn) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_setup(trainer_fn)?;
        }
        Ok(())
    }

    /// Fire batch start event
    pub fn on_batch_start(&mut self, stage: Stage, batch: &mut Batch) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_batch_start(stage, batch)?;
        }
        Ok(())
    }

    /// Fire batch end event
    pub fn on_batch_end(&mut self, stage: Stage, outputs: &mut Batch) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_batch_end(stage, outputs)?;
        }
        Ok(())
    }

    /// Fire epoch end event
    pub fn on_epoch_end(&mut self, stage: Stage) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_epoch_end(stage)?;
        }
        Ok(())
    }
}

impl Default for CallbackManager {
    fn default() -> Self {
        Self::new()
    }
}
