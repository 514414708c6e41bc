//! Image decoding, normalization and the offline augmentation pipeline.

pub mod augmentations;
pub mod config;
pub mod decode;

pub use decode::{DecodeLimits, INPUT_SIZE, NormalizedTensor, decode_image, load_image_path, preprocess};
