//! ONNX artifact - ONNX Runtime session
//!
//! Expects a scikit-learn style export with zipmap disabled:
//! input `[N, 38]` float, output 0 = int64 label, output 1 = `[N, classes]`
//! float probabilities.

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Tensor, ValueType};
use parking_lot::Mutex;

use super::classifier::{confidence_of, ClassLabel, Classification, Classifier, ClassifierError};

pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    label_output: String,
    probability_output: String,
    input_width: Option<usize>,
}

impl OnnxClassifier {
    /// Build a session from model bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, String> {
        let session = Session::builder()
            .map_err(|e| format!("Session builder error: {}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| format!("Optimization error: {}", e))?
            .commit_from_memory(model_bytes)
            .map_err(|e| format!("Load from memory error: {}", e))?;

        let input_width = session.inputs().first().and_then(|input| match input.dtype() {
            ValueType::Tensor { shape, .. } => width_from_dims(shape),
            _ => None,
        });

        let (label_output, probability_output) =
            select_outputs(session.outputs().iter().map(|o| o.name()))?;

        Ok(Self {
            session: Mutex::new(session),
            label_output,
            probability_output,
            input_width,
        })
    }

    fn run(&self, input: &[f32]) -> Result<(i64, Vec<f32>), ClassifierError> {
        if let Some(expected) = self.input_width {
            if input.len() != expected {
                return Err(ClassifierError::ShapeMismatch { expected, actual: input.len() });
            }
        }

        let array = Array2::<f32>::from_shape_vec((1, input.len()), input.to_vec())
            .map_err(|e| ClassifierError::Runtime(format!("Array error: {}", e)))?;
        let tensor = Tensor::from_array(array)
            .map_err(|e| ClassifierError::Runtime(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifierError::Runtime(format!("Inference failed: {}", e)))?;

        let label = outputs
            .get(self.label_output.as_str())
            .ok_or_else(|| ClassifierError::Runtime("No label output".into()))?
            .try_extract_tensor::<i64>()
            .map_err(|e| ClassifierError::Runtime(format!("Label extract error: {}", e)))?
            .1
            .first()
            .copied()
            .ok_or_else(|| ClassifierError::Runtime("Empty label output".into()))?;

        let probabilities = outputs
            .get(self.probability_output.as_str())
            .ok_or_else(|| ClassifierError::Runtime("No probability output".into()))?
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Runtime(format!("Probability extract error: {}", e)))?
            .1
            .to_vec();

        Ok((label, probabilities))
    }
}

/// Feature width from an input shape. Dynamic (-1) or missing → unknown.
fn width_from_dims(dims: &[i64]) -> Option<usize> {
    dims.last().and_then(|&dim| usize::try_from(dim).ok())
}

/// First output is the label, second the class probabilities
fn select_outputs<'a>(mut names: impl Iterator<Item = &'a str>) -> Result<(String, String), String> {
    let label = names.next().ok_or("model defines no outputs")?;
    let probability = names
        .next()
        .ok_or("model defines no probability output (export with zipmap disabled)")?;
    Ok((label.to_string(), probability.to_string()))
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &[f32]) -> Result<i64, ClassifierError> {
        self.run(input).map(|(label, _)| label)
    }

    fn predict_probability(&self, input: &[f32]) -> Result<Vec<f32>, ClassifierError> {
        self.run(input).map(|(_, probabilities)| probabilities)
    }

    fn input_width(&self) -> Option<usize> {
        self.input_width
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }

    /// One session run yields both outputs
    fn classify(&self, input: &[f32]) -> Result<Classification, ClassifierError> {
        let (class, probabilities) = self.run(input)?;
        Ok(Classification {
            label: ClassLabel::from_class(class)?,
            confidence: confidence_of(&probabilities)?,
        })
    }
}
