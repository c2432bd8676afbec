//! Model Module - artifact loading and classification
//!
//! `ModelHandle` owns whatever artifact is serving; artifacts plug in
//! through the `Classifier` trait (JSON linear model, ONNX session).

pub mod classifier;
pub mod handle;
pub mod linear;
#[cfg(feature = "onnx")]
pub mod onnx;

// Re-export common types
pub use classifier::{ClassLabel, Classification, Classifier, ClassifierError};
pub use handle::{ArtifactFormat, LoadedModel, ModelError, ModelHandle, ModelInfo};
pub use linear::{LinearArtifact, LinearClassifier};
