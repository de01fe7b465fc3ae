//! Patient export endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::PatientExport;

/// `GET /api/export-patients`: flat rows, newest first.
pub async fn patients(State(ctx): State<ApiContext>) -> Result<Json<Vec<PatientExport>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(db::export_patients(&conn)?))
}
