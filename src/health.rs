//! Health Reporter - readiness/liveness summary

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ModelHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub model_version: Option<String>,
    pub model_loaded_at: Option<DateTime<Utc>>,
    pub uptime_seconds: f64,
}

pub struct HealthReporter {
    handle: Arc<ModelHandle>,
    started_at: Instant,
}

impl HealthReporter {
    pub fn new(handle: Arc<ModelHandle>) -> Self {
        Self {
            handle,
            started_at: Instant::now(),
        }
    }

    /// Never fails
    pub fn report(&self) -> HealthReport {
        let info = self.handle.info();
        HealthReport {
            status: if info.is_some() { HealthStatus::Healthy } else { HealthStatus::Degraded },
            model_loaded: info.is_some(),
            model_version: info.as_ref().map(|i| i.version.clone()),
            model_loaded_at: info.map(|i| i.loaded_at),
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classifier::tests::FixedClassifier;

    #[test]
    fn test_degraded_without_model() {
        let report = HealthReporter::new(Arc::new(ModelHandle::new("v1.0"))).report();
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(!report.model_loaded);
        assert!(report.model_version.is_none());
        assert!(report.model_loaded_at.is_none());
        assert!(report.uptime_seconds >= 0.0);
    }

    #[test]
    fn test_healthy_with_model() {
        let handle = Arc::new(ModelHandle::new("v1.0"));
        let reporter = HealthReporter::new(handle.clone());
        handle.install(Box::new(FixedClassifier::new(0, 0.9)), None).unwrap();

        let report = reporter.report();
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.model_loaded);
        assert_eq!(report.model_version.as_deref(), Some("v1.0"));
        assert!(report.model_loaded_at.is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
    }
}
