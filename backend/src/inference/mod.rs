pub mod classifier;
pub mod labels;
pub mod loader;
pub mod service;
#[cfg(feature = "torch")]
pub mod torch;

pub use classifier::Classifier;
pub use labels::{ClassNames, DEFAULT_CLASS_NAMES, InputLayout, ModelManifest, OutputActivation};
pub use loader::{InferenceMode, LoadedModel, ModelLoadError, ModelLoader};
pub use service::{InferenceService, PredictionResult};
