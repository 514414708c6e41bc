use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;
use sha2::{Digest, Sha256};

use super::classifier::Classifier;
use super::labels::{ClassNames, ModelManifest};
use crate::preprocess::{INPUT_SIZE, NormalizedTensor};

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model manifest: {0}")]
    InvalidManifest(String),
    #[error("Model artifact {} found but this build lacks the `torch` feature", .0.display())]
    BackendUnavailable(PathBuf),
    #[error("Failed to load model: {0}")]
    Backend(String),
    #[error("Model produces {got} scores but {expected} labels are configured")]
    ClassCountMismatch { expected: usize, got: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDetails {
    pub path: PathBuf,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
}

impl From<&ArtifactDetails> for shared::ArtifactInfo {
    fn from(details: &ArtifactDetails) -> Self {
        Self {
            path: details.path.display().to_string(),
            sha256: details.sha256.clone(),
            loaded_at: details.loaded_at.to_rfc3339(),
        }
    }
}

/// A classifier paired with the labels it was trained on.
pub struct LoadedModel {
    pub classifier: Arc<dyn Classifier>,
    pub manifest: ModelManifest,
    pub artifact: Option<ArtifactDetails>,
}

impl LoadedModel {
    /// Pairs a classifier with its manifest after checking the output width.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        manifest: ModelManifest,
        artifact: Option<ArtifactDetails>,
    ) -> Result<Self, ModelLoadError> {
        check_class_count(classifier.as_ref(), &manifest.labels)?;
        Ok(Self {
            classifier,
            manifest,
            artifact,
        })
    }
}

pub enum InferenceMode {
    Model(LoadedModel),
    /// No artifact: predictions are random draws over `labels`.
    Demo { labels: ClassNames },
}

impl InferenceMode {
    pub fn labels(&self) -> &ClassNames {
        match self {
            InferenceMode::Model(model) => &model.manifest.labels,
            InferenceMode::Demo { labels } => labels,
        }
    }

    pub fn source(&self) -> shared::PredictionSource {
        match self {
            InferenceMode::Model(_) => shared::PredictionSource::Model,
            InferenceMode::Demo { .. } => shared::PredictionSource::Demo,
        }
    }
}

/// Resolves the model artifact once at startup.
pub struct ModelLoader {
    model_path: PathBuf,
}

impl ModelLoader {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
        }
    }

    pub fn load(&self) -> Result<InferenceMode, ModelLoadError> {
        let manifest = ModelManifest::load_for(&self.model_path)?;

        if !self.model_path.exists() {
            log::warn!(
                "Model file not found at {}. Running in demo mode with random predictions.",
                self.model_path.display()
            );
            let labels = manifest.map(|m| m.labels).unwrap_or_default();
            return Ok(InferenceMode::Demo { labels });
        }

        let manifest = match manifest {
            Some(manifest) => manifest,
            None => {
                log::warn!(
                    "No manifest at {}; assuming the default label order",
                    ModelManifest::path_for(&self.model_path).display()
                );
                ModelManifest::default()
            }
        };

        let sha256 = file_sha256(&self.model_path)?;
        let classifier = self.open_classifier(&manifest)?;
        let artifact = ArtifactDetails {
            path: self.model_path.clone(),
            sha256,
            loaded_at: Utc::now(),
        };
        let model = LoadedModel::new(classifier, manifest, Some(artifact))?;

        log::info!(
            "Model loaded from {} ({} classes)",
            self.model_path.display(),
            model.manifest.labels.len()
        );
        Ok(InferenceMode::Model(model))
    }

    #[cfg(feature = "torch")]
    fn open_classifier(&self, manifest: &ModelManifest) -> Result<Arc<dyn Classifier>, ModelLoadError> {
        let classifier = super::torch::TorchClassifier::load(&self.model_path, manifest.layout)?;
        Ok(Arc::new(classifier))
    }

    #[cfg(not(feature = "torch"))]
    fn open_classifier(&self, _manifest: &ModelManifest) -> Result<Arc<dyn Classifier>, ModelLoadError> {
        Err(ModelLoadError::BackendUnavailable(self.model_path.clone()))
    }
}

/// Runs a blank image through the classifier and compares the output width
/// to the label count.
pub fn check_class_count(classifier: &dyn Classifier, labels: &ClassNames) -> Result<(), ModelLoadError> {
    let probe = NormalizedTensor::from_rgb(&RgbImage::new(INPUT_SIZE, INPUT_SIZE));
    let scores = classifier
        .predict(&probe)
        .map_err(|e| ModelLoadError::Backend(e.to_string()))?;
    if scores.len() != labels.len() {
        return Err(ModelLoadError::ClassCountMismatch {
            expected: labels.len(),
            got: scores.len(),
        });
    }
    Ok(())
}

fn file_sha256(path: &Path) -> Result<String, ModelLoadError> {
    let io_err = |source: std::io::Error| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(io_err)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;

    struct FixedWidth(usize);

    impl Classifier for FixedWidth {
        fn predict(&self, _input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
            Ok(vec![1.0 / self.0 as f32; self.0])
        }
    }

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("plantguard-{}.{ext}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_artifact_means_demo_mode() {
        let mode = ModelLoader::new(temp_path("pt")).load().unwrap();
        assert_eq!(mode.source(), shared::PredictionSource::Demo);
        assert_eq!(mode.labels(), &ClassNames::default());
    }

    #[test]
    fn demo_mode_uses_manifest_labels_when_present() {
        let model_path = temp_path("pt");
        let manifest_path = ModelManifest::path_for(&model_path);
        std::fs::write(&manifest_path, "labels: [Grape___healthy, Grape___Black_rot]\n").unwrap();

        let mode = ModelLoader::new(&model_path).load().unwrap();
        std::fs::remove_file(&manifest_path).ok();

        assert_eq!(mode.labels().len(), 2);
        assert_eq!(mode.labels().get(1), Some("Grape___Black_rot"));
    }

    #[test]
    fn broken_manifest_fails_startup() {
        let model_path = temp_path("pt");
        let manifest_path = ModelManifest::path_for(&model_path);
        std::fs::write(&manifest_path, "labels: []\n").unwrap();

        let result = ModelLoader::new(&model_path).load();
        std::fs::remove_file(&manifest_path).ok();

        assert!(matches!(result, Err(ModelLoadError::InvalidManifest(_))));
    }

    #[cfg(not(feature = "torch"))]
    #[test]
    fn artifact_without_backend_is_an_error_not_demo() {
        let model_path = temp_path("pt");
        std::fs::write(&model_path, b"weights").unwrap();

        let result = ModelLoader::new(&model_path).load();
        std::fs::remove_file(&model_path).ok();

        assert!(matches!(result, Err(ModelLoadError::BackendUnavailable(_))));
    }

    #[test]
    fn class_count_mismatch_is_caught_at_load() {
        let err = LoadedModel::new(Arc::new(FixedWidth(3)), ModelManifest::default(), None)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ModelLoadError::ClassCountMismatch { expected: 10, got: 3 }
        ));
        assert!(LoadedModel::new(Arc::new(FixedWidth(10)), ModelManifest::default(), None).is_ok());
    }

    #[test]
    fn sha256_of_known_bytes() {
        let path = temp_path("bin");
        std::fs::write(&path, b"abc").unwrap();
        let digest = file_sha256(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
