use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::pipeline::dosing::CalculationMethod;

/// One audited dose computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub patient_name: String,
    pub drug_name: String,
    pub calculated_dose: String,
    pub calculation_method: CalculationMethod,
    pub user_ip: Option<String>,
    pub timestamp: NaiveDateTime,
}
