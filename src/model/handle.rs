//! Model Handle - owns the loaded artifact
//!
//! The artifact, its version and load time live together in one
//! `Arc<LoadedModel>`. Loading builds a complete new snapshot and swaps it in;
//! readers clone the `Arc` and never see a half-updated model.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::classifier::{Classification, Classifier, ClassifierError};
use super::linear::LinearClassifier;
use crate::features::layout::{layout_hash, ENCODED_FEATURE_COUNT, ENCODED_LAYOUT, FEATURE_VERSION};
use crate::features::EncodedVector;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("model artifact not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported model artifact format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("model expects {model} input features, encoder produces {encoder}")]
    ShapeMismatch { model: usize, encoder: usize },

    #[error("failed to load model from {}: {reason}", .path.display())]
    LoadFailure { path: PathBuf, reason: String },
}

impl ModelError {
    fn load_failure(path: &Path, reason: impl ToString) -> Self {
        ModelError::LoadFailure {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// METADATA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Onnx,
    Linear,
    /// Installed in-process, no file behind it
    Memory,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "onnx" => Some(ArtifactFormat::Onnx),
            "json" => Some(ArtifactFormat::Linear),
            _ => None,
        }
    }
}

/// What is currently serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub version: String,
    pub loaded_at: DateTime<Utc>,
    pub path: Option<PathBuf>,
    pub format: ArtifactFormat,
    pub kind: String,
    /// Hex SHA-256 of the artifact bytes
    pub sha256: Option<String>,
    pub input_width: Option<usize>,
    pub layout_version: u8,
    pub layout_hash: u32,
}

/// Immutable snapshot: artifact + metadata
pub struct LoadedModel {
    classifier: Box<dyn Classifier>,
    info: ModelInfo,
}

impl LoadedModel {
    pub fn version(&self) -> &str {
        &self.info.version
    }

    pub fn classify(&self, vector: &EncodedVector) -> Result<Classification, ClassifierError> {
        self.classifier.classify(vector.as_slice())
    }
}

// ============================================================================
// HANDLE
// ============================================================================

/// Process-wide model slot. Unloaded until the first successful `load`.
pub struct ModelHandle {
    current: RwLock<Option<Arc<LoadedModel>>>,
    /// Version stamped when the artifact does not declare one
    default_version: String,
}

impl ModelHandle {
    pub fn new(default_version: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(None),
            default_version: default_version.into(),
        }
    }

    /// Read and install the artifact at `path`.
    /// On any error the previously loaded model (if any) keeps serving.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<ModelInfo, ModelError> {
        let path = path.as_ref();
        tracing::info!("Loading model from: {}", path.display());

        let result = self.read_artifact(path);
        match &result {
            Ok(info) => tracing::info!(
                version = %info.version,
                kind = %info.kind,
                sha256 = info.sha256.as_deref().unwrap_or("-"),
                "Model loaded successfully from {}",
                path.display()
            ),
            Err(ModelError::NotFound(_)) => {
                tracing::warn!("Model file not found at {}", path.display());
            }
            Err(e) => tracing::error!("Error loading model: {}", e),
        }
        result
    }

    fn read_artifact(&self, path: &Path) -> Result<ModelInfo, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let format = ArtifactFormat::from_path(path)
            .ok_or_else(|| ModelError::UnsupportedFormat(path.to_path_buf()))?;

        let bytes = std::fs::read(path).map_err(|e| ModelError::load_failure(path, e))?;
        let sha256 = format!("{:x}", Sha256::digest(&bytes));

        let (classifier, declared_version): (Box<dyn Classifier>, Option<String>) = match format {
            ArtifactFormat::Linear => {
                let linear = LinearClassifier::from_slice(&bytes)
                    .map_err(|e| ModelError::load_failure(path, e))?;
                check_feature_names(path, linear.artifact().feature_names.as_deref())?;
                let version = linear.artifact().version.clone();
                (Box::new(linear), version)
            }
            ArtifactFormat::Onnx => (load_onnx(path, &bytes)?, None),
            ArtifactFormat::Memory => return Err(ModelError::UnsupportedFormat(path.to_path_buf())),
        };

        let info = self.install_classifier(
            classifier,
            declared_version,
            format,
            Some(path.to_path_buf()),
            Some(sha256),
        )?;
        Ok(info)
    }

    /// Install an in-process classifier, bypassing the filesystem
    pub fn install(
        &self,
        classifier: Box<dyn Classifier>,
        version: Option<String>,
    ) -> Result<ModelInfo, ModelError> {
        self.install_classifier(classifier, version, ArtifactFormat::Memory, None, None)
    }

    fn install_classifier(
        &self,
        classifier: Box<dyn Classifier>,
        version: Option<String>,
        format: ArtifactFormat,
        path: Option<PathBuf>,
        sha256: Option<String>,
    ) -> Result<ModelInfo, ModelError> {
        let input_width = classifier.input_width();
        match input_width {
            Some(width) if width != ENCODED_FEATURE_COUNT => {
                return Err(ModelError::ShapeMismatch {
                    model: width,
                    encoder: ENCODED_FEATURE_COUNT,
                });
            }
            Some(_) => {}
            None => tracing::warn!(
                "Model does not declare its input width, skipping shape check ({} features expected)",
                ENCODED_FEATURE_COUNT
            ),
        }

        let info = ModelInfo {
            version: version.unwrap_or_else(|| self.default_version.clone()),
            loaded_at: Utc::now(),
            path,
            format,
            kind: classifier.kind().to_string(),
            sha256,
            input_width,
            layout_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
        };

        let snapshot = Arc::new(LoadedModel { classifier, info: info.clone() });
        *self.current.write() = Some(snapshot);
        Ok(info)
    }

    /// True iff an artifact is currently loaded
    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    /// Current snapshot; stays valid even if a reload happens meanwhile
    pub fn snapshot(&self) -> Option<Arc<LoadedModel>> {
        self.current.read().clone()
    }

    pub fn info(&self) -> Option<ModelInfo> {
        self.current.read().as_ref().map(|m| m.info.clone())
    }
}

fn check_feature_names(path: &Path, names: Option<&[String]>) -> Result<(), ModelError> {
    let Some(names) = names else {
        return Ok(());
    };

    if names.len() != ENCODED_FEATURE_COUNT {
        return Err(ModelError::ShapeMismatch {
            model: names.len(),
            encoder: ENCODED_FEATURE_COUNT,
        });
    }

    if let Some((i, (got, want))) = names
        .iter()
        .zip(ENCODED_LAYOUT)
        .enumerate()
        .find(|(_, (got, want))| got.as_str() != **want)
    {
        return Err(ModelError::load_failure(
            path,
            format!("feature order mismatch at column {}: artifact has '{}', encoder has '{}'", i, got, want),
        ));
    }

    Ok(())
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path, bytes: &[u8]) -> Result<Box<dyn Classifier>, ModelError> {
    super::onnx::OnnxClassifier::from_bytes(bytes)
        .map(|c| Box::new(c) as Box<dyn Classifier>)
        .map_err(|e| ModelError::load_failure(path, e))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path, _bytes: &[u8]) -> Result<Box<dyn Classifier>, ModelError> {
    Err(ModelError::load_failure(path, "built without the `onnx` feature"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::classifier::tests::FixedClassifier;
    use crate::model::classifier::ClassLabel;
    use crate::model::linear::LinearArtifact;
    use tokio_test::{assert_err, assert_ok};

    pub(crate) fn write_linear(dir: &Path, name: &str, artifact: &LinearArtifact) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_vec(artifact).unwrap()).unwrap();
        path
    }

    fn linear(version: Option<&str>) -> LinearArtifact {
        LinearArtifact {
            version: version.map(String::from),
            feature_names: None,
            weights: vec![0.0; ENCODED_FEATURE_COUNT],
            bias: -1.0,
            threshold: 0.5,
        }
    }

    #[test]
    fn test_unloaded_by_default() {
        let handle = ModelHandle::new("v1.0");
        assert!(!handle.is_ready());
        assert!(handle.info().is_none());
        assert!(handle.snapshot().is_none());
    }

    #[test]
    fn test_load_linear_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_linear(dir.path(), "model.json", &linear(None));

        let handle = ModelHandle::new("v1.0");
        let info = assert_ok!(handle.load(&path));

        assert!(handle.is_ready());
        assert_eq!(info.version, "v1.0");
        assert_eq!(info.format, ArtifactFormat::Linear);
        assert_eq!(info.input_width, Some(ENCODED_FEATURE_COUNT));
        assert_eq!(info.sha256.as_ref().map(|s| s.len()), Some(64));
        assert_eq!(handle.info(), Some(info));
    }

    #[test]
    fn test_artifact_version_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_linear(dir.path(), "model.json", &linear(Some("v2.3")));

        let handle = ModelHandle::new("v1.0");
        assert_eq!(handle.load(&path).unwrap().version, "v2.3");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ModelHandle::new("v1.0");

        let err = assert_err!(handle.load(dir.path().join("absent.onnx")));
        assert!(matches!(err, ModelError::NotFound(_)));
        assert!(!handle.is_ready());
    }

    #[test]
    fn test_corrupt_artifact_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let handle = ModelHandle::new("v1.0");
        let err = assert_err!(handle.load(&path));
        assert!(matches!(err, ModelError::LoadFailure { .. }));
        assert!(!handle.is_ready());
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rf_model.pkl");
        std::fs::write(&path, b"\x80\x04").unwrap();

        let err = ModelHandle::new("v1.0").load(&path).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_width_mismatch_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = linear(None);
        artifact.weights = vec![0.0; 41];
        let path = write_linear(dir.path(), "model.json", &artifact);

        let err = ModelHandle::new("v1.0").load(&path).unwrap_err();
        assert_eq!(err, ModelError::ShapeMismatch { model: 41, encoder: 38 });
    }

    #[test]
    fn test_feature_order_mismatch_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut names: Vec<String> = ENCODED_LAYOUT.iter().map(|s| s.to_string()).collect();
        names.swap(1, 2);
        let mut artifact = linear(None);
        artifact.feature_names = Some(names);
        let path = write_linear(dir.path(), "model.json", &artifact);

        let err = ModelHandle::new("v1.0").load(&path).unwrap_err();
        assert!(err.to_string().contains("column 1"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_model() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_linear(dir.path(), "model.json", &linear(Some("v1.1")));

        let handle = ModelHandle::new("v1.0");
        handle.load(&good).unwrap();
        let before = handle.info().unwrap();

        assert!(handle.load(dir.path().join("gone.json")).is_err());
        assert!(handle.is_ready());
        assert_eq!(handle.info().unwrap(), before);
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let handle = ModelHandle::new("v1.0");
        handle.install(Box::new(FixedClassifier::new(0, 0.9)), Some("a".into())).unwrap();
        let old = handle.snapshot().unwrap();

        handle.install(Box::new(FixedClassifier::new(1, 0.6)), Some("b".into())).unwrap();

        // in-flight holder still sees the old artifact, new readers the new one
        assert_eq!(old.version(), "a");
        assert_eq!(handle.snapshot().unwrap().version(), "b");

        let vector = crate::features::FeatureEncoder::encode(
            &crate::features::FeatureSchema::parse(&crate::features::schema::tests::benign_json()).unwrap(),
        );
        assert_eq!(old.classify(&vector).unwrap().label, ClassLabel::Normal);
        let current = handle.snapshot().unwrap().classify(&vector).unwrap();
        assert_eq!(current.label, ClassLabel::Malicious);
    }

    #[test]
    fn test_width_mismatch_message_names_both_sides() {
        let err = ModelError::ShapeMismatch { model: 41, encoder: 38 };
        assert_eq!(err.to_string(), "model expects 41 input features, encoder produces 38");
    }
}
