//! Fit result structure

use crate::data::Batch;

/// Result of a fit run
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Epochs run
    pub epochs: usize,
    /// Training batches consumed across all epochs
    pub train_batches: usize,
    /// Mean loss of the last epoch, for models that report one
    pub final_loss: Option<f32>,
    /// Lowest epoch loss
    pub best_loss: Option<f32>,
    /// Outputs of the last validation loop
    pub validation: Vec<Batch>,
    /// Total time in seconds
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_result_clone() {
        let result = FitResult {
            epochs: 2,
            train_batches: 8,
            final_loss: Some(0.5),
            best_loss: Some(0.25),
            validation: Vec::new(),
            elapsed_secs: 1.5,
        };
        let cloned = result.clone();
        assert_eq!(cloned.epochs, 2);
        assert_eq!(cloned.best_loss, Some(0.25));
    }
}
