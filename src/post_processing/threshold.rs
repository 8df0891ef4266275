//! Adaptive threshold selection

/// Threshold maximising F1 when predictions `>= threshold` are labelled anomalous.
///
/// Returns `None` for empty input. When no sample is anomalous the F1 score is
/// undefined everywhere and the maximum prediction is returned instead.
pub fn f1_adaptive_threshold(preds: &[f32], labels: &[bool]) -> Option<f32> {
    debug_assert_eq!(preds.len(), labels.len());
    if preds.is_empty() {
        return None;
    }

    let total_pos = labels.iter().filter(|&&l| l).count();
    if total_pos == 0 {
        tracing::warn!(
            samples = preds.len(),
            "no anomalous samples in validation set, using maximum prediction as threshold"
        );
        return preds.iter().copied().reduce(f32::max);
    }

    let mut order: Vec<usize> = (0..preds.len()).collect();
    order.sort_by(|&a, &b| preds[b].total_cmp(&preds[a]));

    let mut best = (f32::NEG_INFINITY, preds[order[0]]);
    let mut tp = 0usize;
    for (rank, &idx) in order.iter().enumerate() {
        if labels[idx] {
            tp += 1;
        }
        let boundary = order
            .get(rank + 1)
            .map_or(true, |&next| preds[next] < preds[idx]);
        if !boundary {
            continue;
        }
        let predicted_pos = rank + 1;
        let f1 = 2.0 * tp as f32 / (predicted_pos + total_pos) as f32;
        if f1 > best.0 {
            best = (f1, preds[idx]);
        }
    }
    Some(best.1)
}
