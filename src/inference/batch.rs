//! Batch Coordinator - ordered, all-or-nothing batch inference

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::engine::{InferenceEngine, InferenceError, PredictionResult};
use crate::features::FeatureRecord;

/// Batch output; `predictions[i]` belongs to input `i`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub predictions: Vec<PredictionResult>,
    pub total_processed: usize,
    pub processing_time_ms: f64,
}

pub struct BatchCoordinator {
    engine: Arc<InferenceEngine>,
}

impl BatchCoordinator {
    pub fn new(engine: Arc<InferenceEngine>) -> Self {
        Self { engine }
    }

    /// Predict every record in input order.
    ///
    /// Readiness is checked once up front and the whole batch runs against a
    /// single model snapshot. The first failing item fails the batch.
    pub fn infer_batch(&self, records: &[FeatureRecord]) -> Result<BatchResult, InferenceError> {
        let model = self
            .engine
            .handle()
            .snapshot()
            .ok_or(InferenceError::ServiceUnavailable)?;

        let start = Instant::now();

        let predictions = records
            .iter()
            .enumerate()
            .map(|(i, record)| self.engine.infer_item(&model, i, record))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::error!("Batch prediction error: {}", e);
                e
            })?;

        let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::info!(
            total = predictions.len(),
            processing_time_ms,
            "batch processed"
        );

        Ok(BatchResult {
            total_processed: predictions.len(),
            predictions,
            processing_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::schema::tests::{benign_json, malicious_json};
    use crate::features::FeatureSchema;
    use crate::inference::engine::{Verdict, UNKNOWN_THREAT};
    use crate::model::classifier::tests::{BrokenClassifier, FixedClassifier, SerrorClassifier};
    use crate::model::{ClassifierError, ModelHandle};

    fn coordinator(classifier: Option<Box<dyn crate::model::Classifier>>) -> BatchCoordinator {
        let handle = Arc::new(ModelHandle::new("v1.0"));
        if let Some(c) = classifier {
            handle.install(c, None).unwrap();
        }
        BatchCoordinator::new(Arc::new(InferenceEngine::new(handle)))
    }

    #[test]
    fn test_empty_batch() {
        let result = coordinator(Some(Box::new(FixedClassifier::new(0, 0.9))))
            .infer_batch(&[])
            .unwrap();
        assert!(result.predictions.is_empty());
        assert_eq!(result.total_processed, 0);
        assert!(result.processing_time_ms >= 0.0);
    }

    #[test]
    fn test_not_ready_fails_whole_batch() {
        let record = FeatureSchema::parse(&benign_json()).unwrap();
        let err = coordinator(None).infer_batch(&[record]).unwrap_err();
        assert_eq!(err, InferenceError::ServiceUnavailable);
    }

    #[test]
    fn test_three_malicious_records() {
        let record = FeatureSchema::parse(&malicious_json()).unwrap();
        let batch = vec![record.clone(), record.clone(), record];

        let result = coordinator(Some(Box::new(FixedClassifier::new(1, 0.99))))
            .infer_batch(&batch)
            .unwrap();

        assert_eq!(result.total_processed, 3);
        for p in &result.predictions {
            assert_eq!(p.prediction, Verdict::Malicious);
            assert_eq!(p.threat_type.as_deref(), Some(UNKNOWN_THREAT));
        }
    }

    #[test]
    fn test_order_preserved() {
        let benign = FeatureSchema::parse(&benign_json()).unwrap();
        let malicious = FeatureSchema::parse(&malicious_json()).unwrap();
        let batch = vec![
            benign.clone(),
            malicious.clone(),
            malicious.clone(),
            benign.clone(),
            malicious,
            benign,
        ];

        let result = coordinator(Some(Box::new(SerrorClassifier)))
            .infer_batch(&batch)
            .unwrap();

        let verdicts: Vec<Verdict> = result.predictions.iter().map(|p| p.prediction).collect();
        let expected: Vec<Verdict> = batch
            .iter()
            .map(|r| if r.serror_rate > 0.5 { Verdict::Malicious } else { Verdict::Normal })
            .collect();
        assert_eq!(verdicts, expected);
    }

    #[test]
    fn test_item_failure_aborts_batch() {
        let record = FeatureSchema::parse(&benign_json()).unwrap();
        let err = coordinator(Some(Box::new(BrokenClassifier)))
            .infer_batch(&[record.clone(), record])
            .unwrap_err();

        assert_eq!(
            err,
            InferenceError::InferenceFailure {
                item: Some(0),
                source: ClassifierError::Runtime("session poisoned".into()),
            }
        );
    }
}
