//! Threat Detector ML Service
//!
//! Serves a trained binary network-traffic classifier ("normal" vs
//! "malicious") for single and batch inference.
//!
//! # Architecture
//!
//! ```text
//!  JSON ──► FeatureSchema ──► FeatureEncoder ──► InferenceEngine ──► PredictionResult
//!                                                     │
//!                      BatchCoordinator ──────────────┤ (per item, in order)
//!                                                     ▼
//!                     HealthReporter ◄──────────  ModelHandle (Arc snapshot)
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod health;
pub mod inference;
pub mod model;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};

use health::HealthReporter;
use inference::{BatchCoordinator, InferenceEngine};
use model::ModelHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub model: Arc<ModelHandle>,
    pub engine: Arc<InferenceEngine>,
    pub batch: Arc<BatchCoordinator>,
    pub health: Arc<HealthReporter>,
}

impl AppState {
    /// Wire the components around one model handle. No model is loaded yet.
    pub fn new(config: Config) -> Self {
        let model = Arc::new(ModelHandle::new(config.model_version.clone()));
        let engine = Arc::new(InferenceEngine::new(model.clone()));

        Self {
            batch: Arc::new(BatchCoordinator::new(engine.clone())),
            health: Arc::new(HealthReporter::new(model.clone())),
            config: Arc::new(config),
            model,
            engine,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::model::info))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/predict/batch", post(handlers::predict::predict_batch))
        .route("/model/reload", post(handlers::model::reload))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
