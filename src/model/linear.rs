//! Linear artifact - logistic regression stored as JSON
//!
//! ```json
//! { "version": "v1.1", "feature_names": [...], "weights": [...], "bias": -0.3, "threshold": 0.5 }
//! ```

use serde::{Deserialize, Serialize};

use super::classifier::{Classifier, ClassifierError};

fn default_threshold() -> f32 {
    0.5
}

/// On-disk form of a logistic regression model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearArtifact {
    #[serde(default)]
    pub version: Option<String>,
    /// Column names the weights were trained against
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub weights: Vec<f32>,
    pub bias: f32,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

/// Logistic regression classifier: p(malicious) = sigmoid(w·x + b)
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    artifact: LinearArtifact,
}

impl LinearClassifier {
    pub fn new(artifact: LinearArtifact) -> Self {
        Self { artifact }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes).map(Self::new)
    }

    pub fn artifact(&self) -> &LinearArtifact {
        &self.artifact
    }

    fn probability(&self, input: &[f32]) -> Result<f32, ClassifierError> {
        let expected = self.artifact.weights.len();
        if input.len() != expected {
            return Err(ClassifierError::ShapeMismatch { expected, actual: input.len() });
        }

        let logit: f32 = input
            .iter()
            .zip(&self.artifact.weights)
            .map(|(x, w)| x * w)
            .sum::<f32>()
            + self.artifact.bias;

        let p = sigmoid(logit);
        if p.is_finite() {
            Ok(p)
        } else {
            Err(ClassifierError::Runtime("non-finite logit".into()))
        }
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, input: &[f32]) -> Result<i64, ClassifierError> {
        Ok(i64::from(self.probability(input)? >= self.artifact.threshold))
    }

    fn predict_probability(&self, input: &[f32]) -> Result<Vec<f32>, ClassifierError> {
        let p = self.probability(input)?;
        Ok(vec![1.0 - p, p])
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.artifact.weights.len())
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
