pub mod health_service;
pub mod items_service;
pub mod recognition_service;

pub use recognition_service::{PlaceholderRecognizer, Recognizer};

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;

use crate::error::AppError;
use crate::validation::ValidationErrors;

/// Unwraps a JSON body; malformed or mistyped JSON is a validation failure.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(ValidationErrors::single(rejection.body_text())))
}

pub(crate) fn item_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::InvalidInput("Invalid item id".to_string()))
}
