use crate::error::InferenceError;
use crate::preprocess::NormalizedTensor;

/// A trained model mapping one normalized image to per-class scores.
///
/// Implementations are shared across request threads and must not mutate
/// themselves observably between calls.
pub trait Classifier: Send + Sync {
    /// Probabilities (or logits, see `ModelManifest::output`) in label order.
    fn predict(&self, input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError>;
}

pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the highest score. Ties go to the lowest index.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best
}

/// Checks a raw output vector against the expected class count.
pub fn validate_scores(scores: &[f32], expected: usize) -> Result<(), InferenceError> {
    if scores.len() != expected {
        return Err(InferenceError::OutputShape {
            expected,
            got: scores.len(),
        });
    }
    if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
        return Err(InferenceError::NonFiniteScore(i));
    }
    Ok(())
}
