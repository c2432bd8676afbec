//! Prediction handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppJson;
use crate::features::{FeatureRecord, FeatureSchema, ValidationError};
use crate::inference::{BatchResult, PredictionResult};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPredictionRequest {
    pub features: Vec<Value>,
}

/// Single prediction
pub async fn predict(
    State(state): State<AppState>,
    AppJson(body): AppJson<Value>,
) -> AppResult<Json<PredictionResult>> {
    let record = FeatureSchema::parse(&body)?;

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.infer(&record)).await??;

    Ok(Json(result))
}

/// Batch prediction, all-or-nothing
pub async fn predict_batch(
    State(state): State<AppState>,
    AppJson(req): AppJson<BatchPredictionRequest>,
) -> AppResult<Json<BatchResult>> {
    let max = state.config.max_batch_size;
    if req.features.len() > max {
        return Err(AppError::BadRequest(format!(
            "Batch too large: {} records (max {})",
            req.features.len(),
            max
        )));
    }

    let records = parse_batch(&req.features)?;

    let batch = state.batch.clone();
    let result = tokio::task::spawn_blocking(move || batch.infer_batch(&records)).await??;

    Ok(Json(result))
}

/// Validate every item; violations carry `features[i].` paths
fn parse_batch(items: &[Value]) -> Result<Vec<FeatureRecord>, ValidationError> {
    let mut records = Vec::with_capacity(items.len());
    let mut errors: Option<ValidationError> = None;

    for (i, item) in items.iter().enumerate() {
        match FeatureSchema::parse(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                let e = e.with_prefix(&format!("features[{}].", i));
                match errors.as_mut() {
                    Some(all) => all.merge(e),
                    None => errors = Some(e),
                }
            }
        }
    }

    match errors {
        Some(e) => Err(e),
        None => Ok(records),
    }
}
