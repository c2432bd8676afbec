//! Configuration module

use std::env;
use std::path::PathBuf;

/// Default artifact location inside the service container
pub const DEFAULT_MODEL_PATH: &str = "/app/model/rf_model.onnx";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Model artifact location
    pub model_path: PathBuf,

    /// Version tag used when the artifact carries none
    pub model_version: String,

    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Upper bound on records per batch request
    pub max_batch_size: usize,

    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_version: "v1.0".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_batch_size: 1000,
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            model_path: get("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            model_version: get("MODEL_VERSION").unwrap_or(defaults.model_version),

            host: get("HOST").unwrap_or(defaults.host),

            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            max_batch_size: get("MAX_BATCH_SIZE")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_batch_size),

            log_json: get("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
        }
    }
}
