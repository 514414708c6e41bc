use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Where a prediction came from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PredictionSource {
    /// A trained classifier produced the label.
    Model,
    /// No model artifact was loaded; label and confidence are random.
    Demo,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
    pub is_healthy: bool,
    pub source: PredictionSource,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ArtifactInfo {
    pub path: String,
    pub sha256: String,
    /// RFC 3339 timestamp.
    pub loaded_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelStatus {
    pub mode: PredictionSource,
    pub class_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub artifact: Option<ArtifactInfo>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    DecodeError,
    PayloadTooLarge,
    ImageTooLarge,
    MissingFile,
    InvalidMultipart,
    Timeout,
    InferenceError,
    Internal,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

impl ErrorResponse {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                kind,
                message: message.into(),
            },
        }
    }
}
