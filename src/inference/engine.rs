//! Inference Engine - one record in, one prediction out
//!
//! encode → classify (against a model snapshot) → label + threat annotation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{FeatureEncoder, FeatureRecord};
use crate::model::{ClassLabel, ClassifierError, LoadedModel, ModelHandle};

/// Threat category attached to every malicious prediction.
/// The model is binary, there is no finer taxonomy yet.
pub const UNKNOWN_THREAT: &str = "unknown";

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Normal,
    Malicious,
}

impl From<ClassLabel> for Verdict {
    fn from(label: ClassLabel) -> Self {
        match label {
            ClassLabel::Normal => Verdict::Normal,
            ClassLabel::Malicious => Verdict::Malicious,
        }
    }
}

/// Prediction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: Verdict,
    /// Max class probability, 0.0 - 1.0
    pub confidence: f32,
    /// Only set for malicious predictions
    pub threat_type: Option<String>,
    pub model_version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Model not loaded. Please train and load the model first.")]
    ServiceUnavailable,

    #[error("Prediction failed: {source}")]
    InferenceFailure {
        /// Position in the batch, if any
        item: Option<usize>,
        #[source]
        source: ClassifierError,
    },
}

impl InferenceError {
    fn at_item(self, index: usize) -> Self {
        match self {
            InferenceError::InferenceFailure { source, .. } => InferenceError::InferenceFailure {
                item: Some(index),
                source,
            },
            other => other,
        }
    }
}

/// Counters since start-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub inference_count: u64,
    pub failure_count: u64,
    pub avg_latency_ms: f64,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct InferenceEngine {
    handle: Arc<ModelHandle>,
    inference_count: AtomicU64,
    failure_count: AtomicU64,
    latency_sum_us: AtomicU64,
}

impl InferenceEngine {
    pub fn new(handle: Arc<ModelHandle>) -> Self {
        Self {
            handle,
            inference_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
        }
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    /// Predict one record against the currently loaded model
    pub fn infer(&self, record: &FeatureRecord) -> Result<PredictionResult, InferenceError> {
        let model = self.handle.snapshot().ok_or(InferenceError::ServiceUnavailable)?;
        self.infer_with(&model, record)
    }

    /// Predict one record against a given snapshot
    pub fn infer_with(
        &self,
        model: &LoadedModel,
        record: &FeatureRecord,
    ) -> Result<PredictionResult, InferenceError> {
        let start = Instant::now();
        let vector = FeatureEncoder::encode(record);

        let outcome = model.classify(&vector);

        self.latency_sum_us
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        let classification = outcome.map_err(|source| {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
            tracing::error!("Prediction error: {}", source);
            InferenceError::InferenceFailure { item: None, source }
        })?;

        let prediction = Verdict::from(classification.label);
        let threat_type = match prediction {
            Verdict::Malicious => Some(UNKNOWN_THREAT.to_string()),
            Verdict::Normal => None,
        };

        tracing::debug!(
            prediction = ?prediction,
            confidence = classification.confidence,
            "record classified"
        );

        Ok(PredictionResult {
            prediction,
            confidence: classification.confidence,
            threat_type,
            model_version: model.version().to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Same as `infer_with`, tagging a failure with its batch position
    pub(crate) fn infer_item(
        &self,
        model: &LoadedModel,
        index: usize,
        record: &FeatureRecord,
    ) -> Result<PredictionResult, InferenceError> {
        self.infer_with(model, record).map_err(|e| e.at_item(index))
    }

    pub fn stats(&self) -> EngineStats {
        let count = self.inference_count.load(Ordering::Relaxed);
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        EngineStats {
            inference_count: count,
            failure_count: self.failure_count.load(Ordering::Relaxed),
            avg_latency_ms: if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 },
        }
    }
}
