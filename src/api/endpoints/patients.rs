//! Patient endpoints.
//!
//! - `POST /api/patients`: validate, compute dose, store
//! - `GET /api/patients`: newest first
//! - `GET /api/patients/:id`: patient plus calculations

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::json_body;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext};
use crate::db;
use crate::models::{Patient, PatientSubmission};
use crate::patients::{self, PatientDetail, SubmittedPatient};

/// `POST /api/patients`
///
/// The remote generation call blocks, so the whole workflow runs on the
/// blocking pool.
pub async fn create(
    State(ctx): State<ApiContext>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<PatientSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmittedPatient>), ApiError> {
    let submission = json_body(payload)?;
    let user_ip = connect_info.map(|ConnectInfo(addr)| addr.ip().to_string());

    let submitted = tokio::task::spawn_blocking(move || {
        let conn = ctx.open_db()?;
        patients::submit_patient(&conn, &ctx.calculator, submission, user_ip.as_deref())
            .map_err(ApiError::from)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(submitted)))
}

/// `GET /api/patients`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(db::list_patients(&conn)?))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientDetail>, ApiError> {
    let id = parse_id(&patient_id)?;
    let conn = ctx.open_db()?;
    Ok(Json(patients::get_patient_detail(&conn, &id)?))
}
