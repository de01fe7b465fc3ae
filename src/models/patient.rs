use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{MedicalCondition, Severity};

/// Stored patient row: the submitted profile plus the headline dose fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: Option<f64>,
    pub medical_condition: MedicalCondition,
    pub drug_name: String,
    pub severity: Severity,
    pub allergies: Option<String>,
    pub notes: Option<String>,
    pub dose: String,
    pub dose_form: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
    pub warnings: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Flat row for `/api/export-patients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientExport {
    pub name: String,
    pub age: u32,
    pub weight: f64,
    pub height: Option<f64>,
    pub medical_condition: MedicalCondition,
    pub drug_name: String,
    pub calculated_dose: String,
    pub dose_form: Option<String>,
    pub frequency: Option<String>,
}

impl From<&Patient> for PatientExport {
    fn from(p: &Patient) -> Self {
        Self {
            name: p.name.clone(),
            age: p.age,
            weight: p.weight_kg,
            height: p.height_cm,
            medical_condition: p.medical_condition,
            drug_name: p.drug_name.clone(),
            calculated_dose: p.dose.clone(),
            dose_form: p.dose_form.clone(),
            frequency: p.frequency.clone(),
        }
    }
}
