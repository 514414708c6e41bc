use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::augmentations::{Augmenter, FillMode, FlipMode};
use super::decode::{INPUT_CHANNELS, INPUT_SIZE};

pub const DEFAULT_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/augmentations.yaml");

#[derive(Debug, thiserror::Error)]
pub enum AugmentationError {
    #[error("Failed to read augmentation config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse augmentation config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid augmentation parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AugmentationConfig {
    pub version: f32,
    pub augmentations: Augmentations,
    pub defaults: Defaults,
    pub image: ImageConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Augmentations {
    pub flip: AugmentationSpec,
    pub rotation: AugmentationSpec,
    pub zoom: AugmentationSpec,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AugmentationSpec {
    pub enabled: bool,
    #[serde(default)]
    pub params: HashMap<String, serde_yaml::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Defaults {
    pub fill_mode: FillMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageConfig {
    pub size: Vec<u32>,
    pub channels: u32,
    pub preprocessing: PreprocessingConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    pub resize_method: String,
}

impl ImageConfig {
    /// Augmented images feed the same 224x224 RGB, bilinear-resized input.
    fn validate(&self) -> Result<(), AugmentationError> {
        if self.size != [INPUT_SIZE, INPUT_SIZE] {
            return Err(AugmentationError::InvalidParam {
                name: "image.size",
                reason: format!("expected [{INPUT_SIZE}, {INPUT_SIZE}], got {:?}", self.size),
            });
        }
        if self.channels as usize != INPUT_CHANNELS {
            return Err(AugmentationError::InvalidParam {
                name: "image.channels",
                reason: format!("expected {INPUT_CHANNELS}, got {}", self.channels),
            });
        }
        match self.preprocessing.resize_method.as_str() {
            "bilinear" | "triangle" => Ok(()),
            other => Err(AugmentationError::InvalidParam {
                name: "image.preprocessing.resize_method",
                reason: format!("only bilinear resizing is supported, got {other:?}"),
            }),
        }
    }
}

impl AugmentationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AugmentationError> {
        let config_str = std::fs::read_to_string(path)?;
        Self::parse(&config_str)
    }

    pub fn load_default() -> Result<Self, AugmentationError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    /// Parses the YAML and checks the `image` section against the classifier input.
    pub fn parse(config_str: &str) -> Result<Self, AugmentationError> {
        let config: Self = serde_yaml::from_str(config_str)?;
        config.image.validate()?;
        Ok(config)
    }

    pub fn to_augmenter(&self) -> Result<Augmenter, AugmentationError> {
        let flip = if self.augmentations.flip.enabled {
            match self.augmentations.flip.params.get("mode").and_then(|v| v.as_str()) {
                None | Some("horizontal_and_vertical") => FlipMode::HorizontalAndVertical,
                Some("horizontal") => FlipMode::Horizontal,
                Some("vertical") => FlipMode::Vertical,
                Some(other) => {
                    return Err(AugmentationError::InvalidParam {
                        name: "flip.mode",
                        reason: format!("unknown mode {other:?}"),
                    });
                }
            }
        } else {
            FlipMode::None
        };

        let rotation_factor = factor(&self.augmentations.rotation, "rotation.factor")?;
        let zoom_factor = factor(&self.augmentations.zoom, "zoom.factor")?;
        if zoom_factor >= 1.0 {
            return Err(AugmentationError::InvalidParam {
                name: "zoom.factor",
                reason: "must be below 1.0".to_string(),
            });
        }

        Ok(Augmenter {
            flip,
            rotation_factor,
            zoom_factor,
            fill_mode: self.defaults.fill_mode,
        })
    }
}

fn factor(spec: &AugmentationSpec, name: &'static str) -> Result<f32, AugmentationError> {
    if !spec.enabled {
        return Ok(0.0);
    }
    let value = spec
        .params
        .get("factor")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.2) as f32;
    if !(0.0..=1.0).contains(&value) {
        return Err(AugmentationError::InvalidParam {
            name,
            reason: format!("{value} is outside [0, 1]"),
        });
    }
    Ok(value)
}
