//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::features::{FieldViolation, ValidationError};
use crate::inference::InferenceError;
use crate::model::ModelError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Client errors
    Validation(Vec<FieldViolation>),
    BadRequest(String),
    /// Body could not be read as JSON; keeps the extractor's status
    InvalidBody(StatusCode, String),

    // Model state
    ServiceUnavailable(String),
    NotFound(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::Validation(violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid feature record",
                Some(json!(violations)),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str(), None),
            AppError::InvalidBody(status, msg) => (*status, msg.as_str(), None),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.as_str(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str(), None),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str(), None)
            }
        };

        let mut body = json!({
            "error": error_message,
            "status": status.as_u16()
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.violations)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.status(), rejection.body_text())
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::ServiceUnavailable => AppError::ServiceUnavailable(err.to_string()),
            InferenceError::InferenceFailure { .. } => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound(_) => AppError::NotFound(err.to_string()),
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("worker task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ViolationKind;
    use crate::model::ClassifierError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::from(InferenceError::ServiceUnavailable), StatusCode::SERVICE_UNAVAILABLE),
            (
                AppError::from(InferenceError::InferenceFailure {
                    item: None,
                    source: ClassifierError::Runtime("boom".into()),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::from(ValidationError::single("land", ViolationKind::Range, "must be 0 or 1")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::from(ModelError::NotFound("/x".into())), StatusCode::NOT_FOUND),
            (AppError::BadRequest("too many".into()), StatusCode::BAD_REQUEST),
            (
                AppError::InvalidBody(StatusCode::UNSUPPORTED_MEDIA_TYPE, "no content type".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
