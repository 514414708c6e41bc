use rand::Rng;
use shared::{ModelStatus, PredictionResponse, PredictionSource};

use super::classifier::{argmax, softmax, validate_scores};
use super::labels::{ClassNames, OutputActivation, is_healthy_label};
use super::loader::{InferenceMode, LoadedModel};
use crate::error::InferenceError;
use crate::preprocess::{DecodeLimits, NormalizedTensor, preprocess};

pub const DEMO_CONFIDENCE_MIN: f32 = 0.85;
pub const DEMO_CONFIDENCE_MAX: f32 = 0.99;

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    pub confidence: f32,
    pub is_healthy: bool,
    pub source: PredictionSource,
}

impl PredictionResult {
    pub fn new(label: impl Into<String>, confidence: f32, source: PredictionSource) -> Self {
        let label = label.into();
        Self {
            is_healthy: is_healthy_label(&label),
            label,
            confidence,
            source,
        }
    }
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            class_name: result.label,
            confidence: result.confidence,
            is_healthy: result.is_healthy,
            source: result.source,
        }
    }
}

/// Decode → normalize → classify for one upload. Shared read-only across
/// requests.
pub struct InferenceService {
    mode: InferenceMode,
    limits: DecodeLimits,
}

impl InferenceService {
    pub fn new(mode: InferenceMode, limits: DecodeLimits) -> Self {
        Self { mode, limits }
    }

    pub fn source(&self) -> PredictionSource {
        self.mode.source()
    }

    pub fn class_names(&self) -> &ClassNames {
        self.mode.labels()
    }

    pub fn status(&self) -> ModelStatus {
        let artifact = match &self.mode {
            InferenceMode::Model(model) => model.artifact.as_ref().map(Into::into),
            InferenceMode::Demo { .. } => None,
        };
        ModelStatus {
            mode: self.source(),
            class_names: self.class_names().to_vec(),
            artifact,
        }
    }

    /// Malformed or oversized images fail here before any model work; the
    /// demo path decodes too so both modes reject the same inputs.
    pub fn predict(&self, bytes: &[u8]) -> Result<PredictionResult, InferenceError> {
        let tensor = preprocess(bytes, &self.limits)?;
        match &self.mode {
            InferenceMode::Model(model) => classify(model, &tensor),
            InferenceMode::Demo { labels } => Ok(demo_prediction(labels, &mut rand::rng())),
        }
    }
}

fn classify(model: &LoadedModel, tensor: &NormalizedTensor) -> Result<PredictionResult, InferenceError> {
    let labels = &model.manifest.labels;
    let scores = model.classifier.predict(tensor)?;
    validate_scores(&scores, labels.len())?;

    let probabilities = match model.manifest.output {
        OutputActivation::Probabilities => scores,
        OutputActivation::Logits => softmax(&scores),
    };
    let (index, top) = argmax(&probabilities)
        .ok_or_else(|| InferenceError::Internal("empty score vector".to_string()))?;
    let label = labels
        .get(index)
        .ok_or_else(|| InferenceError::Internal(format!("no label at index {index}")))?;

    Ok(PredictionResult::new(
        label,
        top.clamp(0.0, 1.0),
        PredictionSource::Model,
    ))
}

/// Uniform label, confidence uniform in [0.85, 0.99].
pub fn demo_prediction<R: Rng + ?Sized>(labels: &ClassNames, rng: &mut R) -> PredictionResult {
    let index = rng.random_range(0..labels.len());
    let label = labels.as_slice()[index].clone();
    let confidence = rng.random_range(DEMO_CONFIDENCE_MIN..=DEMO_CONFIDENCE_MAX);
    PredictionResult::new(label, confidence, PredictionSource::Demo)
}
