use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::loader::ModelLoadError;

/// PlantVillage subset the bundled model was trained on, in output order.
pub const DEFAULT_CLASS_NAMES: [&str; 10] = [
    "Apple___Apple_scab",
    "Apple___Black_rot",
    "Apple___Cedar_apple_rust",
    "Apple___healthy",
    "Potato___Early_blight",
    "Potato___Late_blight",
    "Potato___healthy",
    "Tomato___Early_blight",
    "Tomato___Late_blight",
    "Tomato___healthy",
];

pub fn is_healthy_label(label: &str) -> bool {
    label.to_lowercase().contains("healthy")
}

/// Ordered labels, index-aligned with the classifier output. Never empty,
/// never contains duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassNames(Vec<String>);

impl ClassNames {
    pub fn new(names: Vec<String>) -> Result<Self, ModelLoadError> {
        if names.is_empty() {
            return Err(ModelLoadError::InvalidManifest("label list is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(ModelLoadError::InvalidManifest("blank label".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ModelLoadError::InvalidManifest(format!("duplicate label {name:?}")));
            }
        }
        Ok(Self(names))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl Default for ClassNames {
    fn default() -> Self {
        Self(DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputActivation {
    /// The model ends in softmax.
    #[default]
    Probabilities,
    /// Raw scores; softmax is applied after the forward pass.
    Logits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputLayout {
    Nhwc,
    #[default]
    Nchw,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    labels: Vec<String>,
    #[serde(default)]
    output: OutputActivation,
    #[serde(default)]
    layout: InputLayout,
}

/// Metadata stored next to the model artifact (`<stem>.yaml`).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelManifest {
    pub labels: ClassNames,
    pub output: OutputActivation,
    pub layout: InputLayout,
}

impl Default for ModelManifest {
    fn default() -> Self {
        Self {
            labels: ClassNames::default(),
            output: OutputActivation::default(),
            layout: InputLayout::default(),
        }
    }
}

impl ModelManifest {
    pub fn path_for(model_path: &Path) -> PathBuf {
        model_path.with_extension("yaml")
    }

    pub fn parse(raw: &str) -> Result<Self, ModelLoadError> {
        let raw: RawManifest = serde_yaml::from_str(raw)
            .map_err(|e| ModelLoadError::InvalidManifest(e.to_string()))?;
        Ok(Self {
            labels: ClassNames::new(raw.labels)?,
            output: raw.output,
            layout: raw.layout,
        })
    }

    /// Reads the manifest beside `model_path`, if there is one.
    pub fn load_for(model_path: &Path) -> Result<Option<Self>, ModelLoadError> {
        let path = Self::path_for(model_path);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| ModelLoadError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&raw).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_detection_is_case_insensitive_substring() {
        assert!(is_healthy_label("Tomato___healthy"));
        assert!(is_healthy_label("Apple___HEALTHY"));
        assert!(!is_healthy_label("Potato___Late_blight"));
        assert!(!is_healthy_label("Apple___Cedar_apple_rust"));
    }

    #[test]
    fn default_labels_keep_output_order() {
        let names = ClassNames::default();
        assert_eq!(names.len(), 10);
        assert_eq!(names.get(0), Some("Apple___Apple_scab"));
        assert_eq!(names.get(9), Some("Tomato___healthy"));
        assert_eq!(names.get(10), None);
        let healthy = names.as_slice().iter().filter(|n| is_healthy_label(n)).count();
        assert_eq!(healthy, 3);
    }

    #[test]
    fn duplicate_and_empty_label_lists_are_rejected() {
        assert!(ClassNames::new(vec![]).is_err());
        assert!(ClassNames::new(vec!["a".into(), "a".into()]).is_err());
        assert!(ClassNames::new(vec!["a".into(), " ".into()]).is_err());
    }

    #[test]
    fn manifest_defaults_to_probabilities_nchw() {
        let manifest = ModelManifest::parse("labels: [Corn___healthy, Corn___rust]").unwrap();
        assert_eq!(manifest.labels.len(), 2);
        assert_eq!(manifest.output, OutputActivation::Probabilities);
        assert_eq!(manifest.layout, InputLayout::Nchw);

        let manifest = ModelManifest::parse(
            "labels: [a, b, c]\noutput: logits\nlayout: nhwc\n",
        )
        .unwrap();
        assert_eq!(manifest.output, OutputActivation::Logits);
        assert_eq!(manifest.layout, InputLayout::Nhwc);
    }

    #[test]
    fn manifest_path_sits_next_to_model() {
        assert_eq!(
            ModelManifest::path_for(Path::new("models/plant_disease_model.pt")),
            PathBuf::from("models/plant_disease_model.yaml")
        );
    }

    #[test]
    fn missing_manifest_is_none() {
        let path = std::env::temp_dir().join(format!("{}.pt", uuid::Uuid::new_v4()));
        assert_eq!(ModelManifest::load_for(&path).unwrap(), None);
    }

    #[test]
    fn shipped_manifest_matches_defaults() {
        let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../plant_disease_model.yaml"));
        assert_eq!(ModelManifest::parse(raw).unwrap(), ModelManifest::default());
    }
}
