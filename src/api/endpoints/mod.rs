//! Endpoint handlers, one module per resource.

pub mod audit;
pub mod drug_info;
pub mod drugs;
pub mod export;
pub mod health;
pub mod patients;
pub mod reviews;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::api::error::ApiError;

/// Unwrap a JSON body, turning extractor rejections into structured 400s.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}
