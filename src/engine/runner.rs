//! Sequential engine driving module lifecycles

use super::result::FitResult;
use crate::callback::{CallbackManager, ComponentCallback, Stage, TrainerFn};
use crate::data::Batch;
use crate::error::Result;
use crate::module::{AnomalyModule, TrainerArguments};
use std::time::Instant;

/// Runs fit, validation, test and predict loops over in-memory batches.
///
/// Module components receive their hooks before user callbacks, in slot
/// order.
#[derive(Default)]
pub struct Engine {
    args: TrainerArguments,
    callbacks: CallbackManager,
}

impl Engine {
    /// Create an engine with user trainer settings.
    pub fn new(args: TrainerArguments) -> Self {
        Self {
            args,
            callbacks: CallbackManager::new(),
        }
    }

    /// Register a user callback
    pub fn add_callback<C: ComponentCallback + 'static>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    /// User trainer settings
    pub fn trainer_arguments(&self) -> &TrainerArguments {
        &self.args
    }

    /// Names of the registered user callbacks
    pub fn callback_names(&self) -> Vec<&'static str> {
        self.callbacks.names()
    }

    /// Train `module`, validating after every epoch when `val` is non-empty.
    pub fn fit(
        &mut self,
        module: &mut dyn AnomalyModule,
        train: &[Batch],
        val: &[Batch],
    ) -> Result<FitResult> {
        let start = Instant::now();
        let args = self.prepare(module, TrainerFn::Fit)?;
        let max_epochs = args.max_epochs.unwrap_or(1);
        let sanity_steps = args.num_sanity_val_steps.unwrap_or(0).min(val.len());

        for (batch_idx, batch) in val.iter().take(sanity_steps).enumerate() {
            module.validation_step(batch.clone(), batch_idx)?;
        }
        if sanity_steps > 0 {
            tracing::debug!(steps = sanity_steps, "sanity validation finished");
        }

        let mut train_batches = 0;
        let mut final_loss = None;
        let mut best_loss: Option<f32> = None;
        let mut validation = Vec::new();

        for epoch in 0..max_epochs {
            let mut losses = Vec::new();
            for (batch_idx, batch) in train.iter().enumerate() {
                let mut batch = batch.clone();
                self.batch_start(module, Stage::Train, &mut batch)?;
                if let Some(loss) = module.training_step(&batch, batch_idx)? {
                    losses.push(loss);
                }
                self.batch_end(module, Stage::Train, &mut batch)?;
                train_batches += 1;
            }
            module.on_train_epoch_end()?;
            self.epoch_end(module, Stage::Train)?;

            final_loss = if losses.is_empty() {
                None
            } else {
                Some(losses.iter().sum::<f32>() / losses.len() as f32)
            };
            if let Some(loss) = final_loss {
                best_loss = Some(best_loss.map_or(loss, |b| b.min(loss)));
            }
            tracing::info!(epoch, batches = train.len(), loss = ?final_loss, "epoch finished");

            if !val.is_empty() {
                validation = self.run_loop(module, Stage::Validation, val)?;
            }
        }

        Ok(FitResult {
            epochs: max_epochs,
            train_batches,
            final_loss,
            best_loss,
            validation,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Run a standalone validation loop.
    pub fn validate(
        &mut self,
        module: &mut dyn AnomalyModule,
        batches: &[Batch],
    ) -> Result<Vec<Batch>> {
        self.prepare(module, TrainerFn::Validate)?;
        self.run_loop(module, Stage::Validation, batches)
    }

    /// Run a test loop.
    pub fn test(
        &mut self,
        module: &mut dyn AnomalyModule,
        batches: &[Batch],
    ) -> Result<Vec<Batch>> {
        self.prepare(module, TrainerFn::Test)?;
        self.run_loop(module, Stage::Test, batches)
    }

    /// Run a predict loop.
    pub fn predict(
        &mut self,
        module: &mut dyn AnomalyModule,
        batches: &[Batch],
    ) -> Result<Vec<Batch>> {
        self.prepare(module, TrainerFn::Predict)?;
        self.run_loop(module, Stage::Predict, batches)
    }

    fn prepare(
        &mut self,
        module: &mut dyn AnomalyModule,
        trainer_fn: TrainerFn,
    ) -> Result<TrainerArguments> {
        let args = self.args.merge(&module.trainer_arguments());
        module.setup(Some(trainer_fn))?;
        for callback in module.configure_callbacks() {
            callback.on_setup(trainer_fn)?;
        }
        self.callbacks.on_setup(trainer_fn)?;
        tracing::info!(model = module.name(), ?trainer_fn, "module ready");
        Ok(args)
    }

    fn run_loop(
        &mut self,
        module: &mut dyn AnomalyModule,
        stage: Stage,
        batches: &[Batch],
    ) -> Result<Vec<Batch>> {
        let mut outputs = Vec::with_capacity(batches.len());
        for (batch_idx, batch) in batches.iter().enumerate() {
            let mut batch = batch.clone();
            self.batch_start(module, stage, &mut batch)?;
            let mut output = match stage {
                Stage::Validation => module.validation_step(batch, batch_idx)?,
                Stage::Test => module.test_step(batch, batch_idx)?,
                Stage::Predict => module.predict_step(batch, batch_idx, 0)?,
                Stage::Train => batch,
            };
            self.batch_end(module, stage, &mut output)?;
            outputs.push(output);
        }
        self.epoch_end(module, stage)?;
        tracing::debug!(%stage, batches = outputs.len(), "loop finished");
        Ok(outputs)
    }

    fn batch_start(
        &mut self,
        module: &mut dyn AnomalyModule,
        stage: Stage,
        batch: &mut Batch,
    ) -> Result<()> {
        for callback in module.configure_callbacks() {
            callback.on_batch_start(stage, batch)?;
        }
        self.callbacks.on_batch_start(stage, batch)
    }

    fn batch_end(
        &mut self,
        module: &mut dyn AnomalyModule,
        stage: Stage,
        outputs: &mut Batch,
    ) -> Result<()> {
        for callback in module.configure_callbacks() {
            callback.on_batch_end(stage, outputs)?;
        }
        self.callbacks.on_batch_end(stage, outputs)
    }

    fn epoch_end(&mut self, module: &mut dyn AnomalyModule, stage: Stage) -> Result<()> {
        for callback in module.configure_callbacks() {
            callback.on_epoch_end(stage)?;
        }
        self.callbacks.on_epoch_end(stage)
    }
}
