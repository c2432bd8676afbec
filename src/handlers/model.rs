//! Model administration and service info

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::features::LayoutInfo;
use crate::model::ModelInfo;
use crate::{AppResult, AppState};

/// Re-read the configured artifact. The old model keeps serving on failure.
pub async fn reload(State(state): State<AppState>) -> AppResult<Json<ModelInfo>> {
    let handle = state.model.clone();
    let path = state.config.model_path.clone();

    tracing::info!("Model reload requested");
    let info = tokio::task::spawn_blocking(move || handle.load(path)).await??;

    Ok(Json(info))
}

/// Root endpoint
pub async fn info(State(state): State<AppState>) -> Json<Value> {
    let model = state.model.info();

    Json(json!({
        "service": "Threat Detector ML Service",
        "version": env!("CARGO_PKG_VERSION"),
        "model_version": model
            .as_ref()
            .map(|m| m.version.clone())
            .unwrap_or_else(|| state.config.model_version.clone()),
        "model_loaded": model.is_some(),
        "feature_layout": LayoutInfo::current(),
        "engine": state.engine.stats(),
        "endpoints": {
            "health": "/health",
            "predict": "/predict",
            "batch_predict": "/predict/batch",
            "reload": "/model/reload"
        }
    }))
}
