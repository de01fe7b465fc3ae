//! Shared state for the API layer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db;
use crate::pipeline::dosing::{DoseCalculator, DrugInfoLookup, LlmClient};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes.
///
/// Holds the single remote client (behind the calculator and the drug info
/// lookup) and the database location. Connections are opened per request.
#[derive(Clone)]
pub struct ApiContext {
    pub calculator: DoseCalculator,
    pub drug_info: DrugInfoLookup,
    pub model_name: Arc<str>,
    db_path: Arc<PathBuf>,
}

impl ApiContext {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, db_path: impl Into<PathBuf>) -> Self {
        let model_name: Arc<str> = Arc::from(llm.model_name());
        Self {
            calculator: DoseCalculator::new(llm.clone()),
            drug_info: DrugInfoLookup::new(llm),
            model_name,
            db_path: Arc::new(db_path.into()),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection to the application database, migrating if needed.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        db::open_database(&self.db_path).map_err(ApiError::from)
    }
}

/// Parse a path id, rejecting malformed values with 400.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid ID format: {raw}")))
}
