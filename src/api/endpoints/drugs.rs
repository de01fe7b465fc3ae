//! Drug catalog endpoints.
//!
//! Reference data only: the dose pipeline never reads the catalog.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::json_body;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext};
use crate::db;
use crate::models::{Drug, DrugFormulation, DrugSubmission, FormulationSubmission};

#[derive(Serialize)]
pub struct DrugDetailResponse {
    pub drug: Drug,
    pub formulations: Vec<DrugFormulation>,
}

/// `POST /api/drugs`: 409 when the name is taken.
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<DrugSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Drug>), ApiError> {
    let drug = json_body(payload)?.into_drug()?;
    let conn = ctx.open_db()?;
    db::insert_drug(&conn, &drug)?;
    Ok((StatusCode::CREATED, Json(drug)))
}

/// `GET /api/drugs`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Drug>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(db::list_drugs(&conn)?))
}

/// `GET /api/drugs/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(drug_id): Path<String>,
) -> Result<Json<DrugDetailResponse>, ApiError> {
    let id = parse_id(&drug_id)?;
    let conn = ctx.open_db()?;
    let drug = db::get_drug(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Drug {id} not found")))?;
    let formulations = db::get_formulations_for_drug(&conn, &id)?;
    Ok(Json(DrugDetailResponse { drug, formulations }))
}

/// `POST /api/drugs/:id/formulations`
pub async fn add_formulation(
    State(ctx): State<ApiContext>,
    Path(drug_id): Path<String>,
    payload: Result<Json<FormulationSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<DrugFormulation>), ApiError> {
    let id = parse_id(&drug_id)?;
    let formulation = json_body(payload)?.into_formulation(id)?;

    let conn = ctx.open_db()?;
    if db::get_drug(&conn, &id)?.is_none() {
        return Err(ApiError::NotFound(format!("Drug {id} not found")));
    }
    db::insert_formulation(&conn, &formulation)?;
    Ok((StatusCode::CREATED, Json(formulation)))
}
