//! Trainer arguments requested by a model variant

use serde::{Deserialize, Serialize};

/// Trainer settings. `None` leaves the trainer's own default in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainerArguments {
    /// Number of training epochs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_epochs: Option<usize>,
    /// Validation batches run before training starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_sanity_val_steps: Option<usize>,
    /// Gradient clipping value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_clip_val: Option<f32>,
    /// Number of devices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<usize>,
}

fn pick<T: PartialEq + Copy + std::fmt::Debug>(
    field: &str,
    user: Option<T>,
    model: Option<T>,
) -> Option<T> {
    match (user, model) {
        (Some(u), Some(m)) if u != m => {
            tracing::warn!(
                field,
                user = ?u,
                model = ?m,
                "model requires a different trainer setting, overriding user value"
            );
            Some(m)
        }
        (u, m) => m.or(u),
    }
}

impl TrainerArguments {
    /// Combine user settings with the model's requirements. Model values win.
    pub fn merge(&self, model: &TrainerArguments) -> TrainerArguments {
        TrainerArguments {
            max_epochs: pick("max_epochs", self.max_epochs, model.max_epochs),
            num_sanity_val_steps: pick(
                "num_sanity_val_steps",
                self.num_sanity_val_steps,
                model.num_sanity_val_steps,
            ),
            gradient_clip_val: pick(
                "gradient_clip_val",
                self.gradient_clip_val,
                model.gradient_clip_val,
            ),
            devices: pick("devices", self.devices, model.devices),
        }
    }
}
