//! Inference Module - single and batch prediction

pub mod engine;
pub mod batch;

// Re-export common types
pub use engine::{EngineStats, InferenceEngine, InferenceError, PredictionResult, Verdict, UNKNOWN_THREAT};
pub use batch::{BatchCoordinator, BatchResult};
