//! Drug information lookup endpoint.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::dosing::DrugInfo;

/// `GET /api/drug-info/:drug_name`
///
/// Always 200: the body carries either `information` or `error`.
pub async fn lookup(
    State(ctx): State<ApiContext>,
    Path(drug_name): Path<String>,
) -> Result<Json<DrugInfo>, ApiError> {
    let drug_name = drug_name.trim().to_string();
    if drug_name.is_empty() {
        return Err(ApiError::BadRequest("Drug name is required".into()));
    }

    let info = tokio::task::spawn_blocking(move || ctx.drug_info.lookup(&drug_name)).await?;
    Ok(Json(info))
}
