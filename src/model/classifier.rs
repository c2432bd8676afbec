//! Classifier seam - what a loaded artifact must support

use thiserror::Error;

/// Failure inside a model call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("input has {actual} features, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model returned unexpected class {0}")]
    UnexpectedClass(i64),

    #[error("model runtime error: {0}")]
    Runtime(String),
}

/// Binary class decided by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassLabel {
    Normal,
    Malicious,
}

impl ClassLabel {
    pub fn from_class(class: i64) -> Result<Self, ClassifierError> {
        match class {
            0 => Ok(ClassLabel::Normal),
            1 => Ok(ClassLabel::Malicious),
            other => Err(ClassifierError::UnexpectedClass(other)),
        }
    }
}

/// Decision plus its confidence (max class probability)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: ClassLabel,
    pub confidence: f32,
}

/// Max class probability, clamped to [0, 1]
pub fn confidence_of(probabilities: &[f32]) -> Result<f32, ClassifierError> {
    probabilities
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(None, |acc: Option<f32>, p| Some(acc.map_or(p, |a| a.max(p))))
        .map(|p| p.clamp(0.0, 1.0))
        .ok_or_else(|| ClassifierError::Runtime("model returned no class probabilities".into()))
}

/// A trained model artifact. Implementations are read-only once built and
/// are shared across concurrent requests.
pub trait Classifier: Send + Sync {
    /// Predicted class id for one input row
    fn predict(&self, input: &[f32]) -> Result<i64, ClassifierError>;

    /// Per-class probabilities for one input row
    fn predict_probability(&self, input: &[f32]) -> Result<Vec<f32>, ClassifierError>;

    /// Expected input width, if the artifact declares one
    fn input_width(&self) -> Option<usize>;

    /// Short artifact kind, for logs and model info
    fn kind(&self) -> &'static str;

    /// Decision and confidence in one call
    fn classify(&self, input: &[f32]) -> Result<Classification, ClassifierError> {
        let label = ClassLabel::from_class(self.predict(input)?)?;
        let confidence = confidence_of(&self.predict_probability(input)?)?;
        Ok(Classification { label, confidence })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Always answers the same class with fixed probabilities
    pub(crate) struct FixedClassifier {
        pub class: i64,
        pub probabilities: Vec<f32>,
        pub width: Option<usize>,
    }

    impl FixedClassifier {
        pub fn new(class: i64, confidence: f32) -> Self {
            let other = 1.0 - confidence;
            let probabilities = if class == 1 {
                vec![other, confidence]
            } else {
                vec![confidence, other]
            };
            Self {
                class,
                probabilities,
                width: Some(crate::features::ENCODED_FEATURE_COUNT),
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn predict(&self, input: &[f32]) -> Result<i64, ClassifierError> {
            if let Some(expected) = self.width {
                if input.len() != expected {
                    return Err(ClassifierError::ShapeMismatch { expected, actual: input.len() });
                }
            }
            Ok(self.class)
        }

        fn predict_probability(&self, _input: &[f32]) -> Result<Vec<f32>, ClassifierError> {
            Ok(self.probabilities.clone())
        }

        fn input_width(&self) -> Option<usize> {
            self.width
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    /// Malicious when `serror_rate` (encoded column 21) is set
    pub(crate) struct SerrorClassifier;

    impl Classifier for SerrorClassifier {
        fn predict(&self, input: &[f32]) -> Result<i64, ClassifierError> {
            Ok(i64::from(input[21] > 0.5))
        }

        fn predict_probability(&self, input: &[f32]) -> Result<Vec<f32>, ClassifierError> {
            let p = input[21].clamp(0.0, 1.0);
            Ok(vec![1.0 - p, p])
        }

        fn input_width(&self) -> Option<usize> {
            Some(crate::features::ENCODED_FEATURE_COUNT)
        }

        fn kind(&self) -> &'static str {
            "serror"
        }
    }

    /// Fails every call
    pub(crate) struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn predict(&self, _input: &[f32]) -> Result<i64, ClassifierError> {
            Err(ClassifierError::Runtime("session poisoned".into()))
        }

        fn predict_probability(&self, _input: &[f32]) -> Result<Vec<f32>, ClassifierError> {
            Err(ClassifierError::Runtime("session poisoned".into()))
        }

        fn input_width(&self) -> Option<usize> {
            None
        }

        fn kind(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_confidence_is_max_probability() {
        assert_eq!(confidence_of(&[0.2, 0.8]).unwrap(), 0.8);
        assert_eq!(confidence_of(&[0.9, 0.1]).unwrap(), 0.9);
        assert_eq!(confidence_of(&[f32::NAN, 0.3]).unwrap(), 0.3);
        assert!(confidence_of(&[]).is_err());
    }

    #[test]
    fn test_class_label_mapping() {
        assert_eq!(ClassLabel::from_class(0).unwrap(), ClassLabel::Normal);
        assert_eq!(ClassLabel::from_class(1).unwrap(), ClassLabel::Malicious);
        assert_eq!(ClassLabel::from_class(4), Err(ClassifierError::UnexpectedClass(4)));
    }

    #[test]
    fn test_default_classify() {
        let c = FixedClassifier::new(1, 0.75);
        let out = c.classify(&[0.0; crate::features::ENCODED_FEATURE_COUNT]).unwrap();
        assert_eq!(out.label, ClassLabel::Malicious);
        assert_eq!(out.confidence, 0.75);

        let err = c.classify(&[0.0; 3]).unwrap_err();
        assert_eq!(err, ClassifierError::ShapeMismatch { expected: 38, actual: 3 });
    }
}
