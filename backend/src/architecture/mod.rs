//! Classifier architectures for offline training. Requires the `torch` feature.
//!
//! Both builders take NCHW input of shape (N, 3, 224, 224) and end in softmax
//! over the class axis, so an exported module pairs with a manifest whose
//! `output` is `probabilities` and `layout` is `nchw`.

pub mod compile;
pub mod custom_cnn;
pub mod transfer;

pub use compile::{CompileOptions, CompiledModel, accuracy, compile, sparse_categorical_crossentropy};
pub use custom_cnn::custom_cnn;
pub use transfer::{TransferConfig, TransferModel, load_backbone};

pub const IMG_SIZE: i64 = 224;
pub const BATCH_SIZE: i64 = 32;
pub const EPOCHS: usize = 10;
