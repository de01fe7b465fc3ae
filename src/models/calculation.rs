use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::VerificationStatus;
use super::profile::{optional_text, parse_choice, required_text, ValidationError};
use crate::pipeline::dosing::{CalculationMethod, DoseFactors, DoseRecommendation};

/// One dose computation for a patient, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseCalculation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub calculation_method: CalculationMethod,
    pub recommendation: DoseRecommendation,
    /// Fallback formula trace; `None` for remote results.
    pub factors: Option<DoseFactors>,
    pub remote_response: Option<String>,
    pub verified_by_expert: bool,
    pub expert_notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertReview {
    pub id: Uuid,
    pub calculation_id: Uuid,
    pub expert_name: String,
    pub verification_status: VerificationStatus,
    pub expert_notes: Option<String>,
    pub recommended_dose: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Raw review form, before checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewSubmission {
    pub expert_name: Option<String>,
    pub verification_status: Option<String>,
    pub expert_notes: Option<String>,
    pub recommended_dose: Option<String>,
}

impl ReviewSubmission {
    /// Validate and stamp a review of `calculation_id`.
    pub fn into_review(self, calculation_id: Uuid) -> Result<ExpertReview, ValidationError> {
        let mut errors = Vec::new();

        let expert_name = required_text(&mut errors, "expert_name", self.expert_name, 1, 100);
        let verification_status = parse_choice::<VerificationStatus>(
            &mut errors,
            "verification_status",
            self.verification_status,
        );
        let expert_notes = optional_text(&mut errors, "expert_notes", self.expert_notes, 1000);
        let recommended_dose =
            optional_text(&mut errors, "recommended_dose", self.recommended_dose, 100);

        match (expert_name, verification_status) {
            (Some(expert_name), Some(verification_status)) if errors.is_empty() => {
                Ok(ExpertReview {
                    id: Uuid::new_v4(),
                    calculation_id,
                    expert_name,
                    verification_status,
                    expert_notes,
                    recommended_dose,
                    created_at: chrono::Local::now().naive_local(),
                })
            }
            _ => Err(ValidationError { fields: errors }),
        }
    }
}
