//! Expert review endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::json_body;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext};
use crate::db;
use crate::models::{ExpertReview, ReviewSubmission};
use crate::patients::{self, CalculationDetail};

/// `GET /api/calculations/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(calculation_id): Path<String>,
) -> Result<Json<CalculationDetail>, ApiError> {
    let calculation_id = parse_id(&calculation_id)?;
    let conn = ctx.open_db()?;
    Ok(Json(patients::get_calculation_detail(&conn, &calculation_id)?))
}

/// `POST /api/calculations/:id/review`
pub async fn submit(
    State(ctx): State<ApiContext>,
    Path(calculation_id): Path<String>,
    payload: Result<Json<ReviewSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<ExpertReview>), ApiError> {
    let calculation_id = parse_id(&calculation_id)?;
    let review = json_body(payload)?.into_review(calculation_id)?;

    let conn = ctx.open_db()?;
    db::record_expert_review(&conn, &review)?;

    tracing::info!(
        calculation_id = %calculation_id,
        status = review.verification_status.as_str(),
        "Expert review recorded"
    );
    Ok((StatusCode::CREATED, Json(review)))
}
