//! Audit trail endpoint.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::AuditEntry;

pub const DEFAULT_AUDIT_LIMIT: u32 = 50;
pub const MAX_AUDIT_LIMIT: u32 = 500;

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<u32>,
}

/// `GET /api/audit?limit=N`: newest first, limit clamped to 1..=500.
pub async fn recent(
    State(ctx): State<ApiContext>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);

    let conn = ctx.open_db()?;
    Ok(Json(db::recent_audit_entries(&conn, limit)?))
}
