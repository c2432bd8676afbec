//! Feature Schema - request validation
//!
//! Turns an untrusted JSON object into a [`FeatureRecord`].
//! Every field is checked (presence, type, range) before anything is
//! reported, so callers see all problems of a request at once.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use validator::Validate;

use super::layout::{feature_spec, FeatureKind, FeatureSpec, FEATURE_COUNT, FEATURE_LAYOUT};

// ============================================================================
// FEATURE RECORD
// ============================================================================

/// One validated network connection observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeatureRecord {
    pub duration: f64,
    pub protocol_type: String,
    pub service: String,
    pub flag: String,
    #[validate(range(min = 0))]
    pub src_bytes: i64,
    #[validate(range(min = 0))]
    pub dst_bytes: i64,
    #[validate(range(min = 0, max = 1))]
    pub land: i64,
    #[validate(range(min = 0))]
    pub wrong_fragment: i64,
    #[validate(range(min = 0))]
    pub urgent: i64,
    #[validate(range(min = 0))]
    pub hot: i64,
    #[validate(range(min = 0))]
    pub num_failed_logins: i64,
    #[validate(range(min = 0, max = 1))]
    pub logged_in: i64,
    #[validate(range(min = 0))]
    pub num_compromised: i64,
    #[validate(range(min = 0, max = 1))]
    pub root_shell: i64,
    #[validate(range(min = 0, max = 1))]
    pub su_attempted: i64,
    #[validate(range(min = 0))]
    pub num_root: i64,
    #[validate(range(min = 0))]
    pub num_file_creations: i64,
    #[validate(range(min = 0))]
    pub num_shells: i64,
    #[validate(range(min = 0))]
    pub num_access_files: i64,
    #[validate(range(min = 0))]
    pub num_outbound_cmds: i64,
    #[validate(range(min = 0, max = 1))]
    pub is_host_login: i64,
    #[validate(range(min = 0, max = 1))]
    pub is_guest_login: i64,
    #[validate(range(min = 0))]
    pub count: i64,
    #[validate(range(min = 0))]
    pub srv_count: i64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub serror_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub srv_serror_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub rerror_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub srv_rerror_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub same_srv_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub diff_srv_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub srv_diff_host_rate: f64,
    #[validate(range(min = 0))]
    pub dst_host_count: i64,
    #[validate(range(min = 0))]
    pub dst_host_srv_count: i64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dst_host_same_srv_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dst_host_diff_srv_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dst_host_same_src_port_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dst_host_srv_diff_host_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dst_host_serror_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dst_host_srv_serror_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dst_host_rerror_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dst_host_srv_rerror_rate: f64,
}

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    Type,
    Range,
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Every violated field of one request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} invalid field(s): {}", .violations.len(), summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn single(field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, kind, message)],
        }
    }

    /// True if `field` is among the violations
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Prefix every field path, e.g. `features[3].`
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        for v in &mut self.violations {
            v.field = format!("{}{}", prefix, v.field);
        }
        self
    }

    pub fn merge(&mut self, other: ValidationError) {
        self.violations.extend(other.violations);
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Stateless validator for feature records
pub struct FeatureSchema;

impl FeatureSchema {
    /// Validate one raw input. Pure; collects every violation.
    pub fn parse(input: &Value) -> Result<FeatureRecord, ValidationError> {
        let object = input.as_object().ok_or_else(|| {
            ValidationError::single("$", ViolationKind::Type, "expected a JSON object")
        })?;

        let mut violations = Vec::new();
        let mut normalized = Map::with_capacity(FEATURE_COUNT);

        // Presence and type. Rejected fields get a neutral placeholder so the
        // range pass can still run over everything else.
        for spec in FEATURE_LAYOUT {
            let value = match object.get(spec.name) {
                None | Some(Value::Null) => {
                    violations.push(FieldViolation::new(
                        spec.name,
                        ViolationKind::Missing,
                        "field required",
                    ));
                    placeholder(spec.kind)
                }
                Some(raw) => coerce(spec, raw).unwrap_or_else(|(kind, message)| {
                    violations.push(FieldViolation::new(spec.name, kind, message));
                    placeholder(spec.kind)
                }),
            };
            normalized.insert(spec.name.to_string(), value);
        }

        let record: FeatureRecord = serde_json::from_value(Value::Object(normalized))
            .map_err(|e| ValidationError::single("$", ViolationKind::Type, e.to_string()))?;

        // Range
        if let Err(errors) = record.validate() {
            for (field, _) in errors.field_errors() {
                let field = field.to_string();
                let message = feature_spec(&field)
                    .map(|s| s.kind.constraint())
                    .unwrap_or("out of range");
                violations.push(FieldViolation::new(field, ViolationKind::Range, message));
            }
        }

        if violations.is_empty() {
            return Ok(record);
        }

        violations.sort_by_key(|v| {
            FEATURE_LAYOUT
                .iter()
                .position(|s| s.name == v.field)
                .unwrap_or(usize::MAX)
        });

        Err(ValidationError { violations })
    }
}

fn placeholder(kind: FeatureKind) -> Value {
    match kind {
        FeatureKind::Categorical => Value::String(String::new()),
        k if k.is_integer() => Value::from(0i64),
        _ => Value::from(0.0f64),
    }
}

/// Kind and message of a value that could not be coerced
type Rejection = (ViolationKind, String);

fn type_error(message: &str) -> Rejection {
    (ViolationKind::Type, message.to_string())
}

/// Coerce a raw JSON value into the representation `kind` expects
fn coerce(spec: &FeatureSpec, raw: &Value) -> Result<Value, Rejection> {
    match spec.kind {
        FeatureKind::Categorical => match raw {
            Value::String(s) => Ok(Value::String(s.clone())),
            _ => Err(type_error("expected a string")),
        },
        kind if kind.is_integer() => coerce_integer(raw, kind).map(Value::from),
        _ => coerce_float(raw).and_then(|f| {
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| type_error("expected a finite number"))
        }),
    }
}

/// Integral values outside i64 are a range problem, not a type problem
fn coerce_integer(raw: &Value, kind: FeatureKind) -> Result<i64, Rejection> {
    let number = match raw {
        Value::Bool(b) => return Ok(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => return Ok(i),
            None => n.as_f64(),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => return Ok(i),
                Err(_) => s.parse::<f64>().ok(),
            }
        }
        _ => None,
    };

    match number {
        Some(f) if f.is_finite() && f.fract() == 0.0 => {
            integral(f).ok_or_else(|| out_of_range(f, kind))
        }
        _ => Err(type_error("expected an integer")),
    }
}

fn integral(f: f64) -> Option<i64> {
    // i64::MAX is not exactly representable, stay strictly below 2^63
    if (-9.223_372_036_854_775_808e18..9.223_372_036_854_775_808e18).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn out_of_range(f: f64, kind: FeatureKind) -> Rejection {
    let message = if f > 0.0 {
        format!("must be an integer <= {}", i64::MAX)
    } else {
        kind.constraint().to_string()
    };
    (ViolationKind::Range, message)
}

fn coerce_float(raw: &Value) -> Result<f64, Rejection> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| type_error("expected a number"))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(type_error("expected a finite number"))
    }
}
