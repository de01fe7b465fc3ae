//! Patient submission workflow: validate, compute a dose, persist with provenance.
//!
//! Persistence of the patient row, its dose calculation and the audit row
//! happens in one transaction, so a stored patient always carries the method
//! that produced its dose.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{
    DoseCalculation, ExpertReview, Patient, PatientProfile, PatientSubmission, ValidationError,
};
use crate::pipeline::dosing::{CalculationMethod, DoseCalculator, DoseRecommendation};

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ═══════════════════════════════════════════
// View types
// ═══════════════════════════════════════════

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedPatient {
    pub patient: Patient,
    pub calculation_id: Uuid,
    pub recommendation: DoseRecommendation,
    pub calculation_method: CalculationMethod,
}

/// A stored patient together with every calculation made for them.
#[derive(Debug, Clone, Serialize)]
pub struct PatientDetail {
    pub patient: Patient,
    pub calculations: Vec<DoseCalculation>,
}

/// One calculation and its expert reviews, oldest review first.
#[derive(Debug, Clone, Serialize)]
pub struct CalculationDetail {
    pub calculation: DoseCalculation,
    pub reviews: Vec<ExpertReview>,
}

// ═══════════════════════════════════════════
// Workflow
// ═══════════════════════════════════════════

/// Validate a submission, compute its dose and store the result.
///
/// Blocks on the remote generation call; callers on an async runtime should
/// run this on a blocking thread.
pub fn submit_patient(
    conn: &Connection,
    calculator: &DoseCalculator,
    submission: PatientSubmission,
    user_ip: Option<&str>,
) -> Result<SubmittedPatient, SubmitError> {
    let profile = submission.validate()?;
    let outcome = calculator.compute_dose(&profile);
    let now = chrono::Local::now().naive_local();

    let patient = patient_record(&profile, &outcome.recommendation, now);
    let calculation = DoseCalculation {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        calculation_method: outcome.method,
        recommendation: outcome.recommendation.clone(),
        factors: outcome.factors,
        remote_response: outcome.raw_response,
        verified_by_expert: false,
        expert_notes: None,
        created_at: now,
    };

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    db::insert_patient(&tx, &patient)?;
    db::insert_dose_calculation(&tx, &calculation)?;
    db::insert_audit_entry(
        &tx,
        &patient.name,
        &patient.drug_name,
        &patient.dose,
        outcome.method,
        user_ip,
        &now,
    )?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        patient_id = %patient.id,
        drug = %patient.drug_name,
        method = outcome.method.as_str(),
        "Patient stored"
    );

    Ok(SubmittedPatient {
        patient,
        calculation_id: calculation.id,
        recommendation: outcome.recommendation,
        calculation_method: outcome.method,
    })
}

/// Load a patient with its calculations; `NotFound` when absent.
pub fn get_patient_detail(conn: &Connection, id: &Uuid) -> Result<PatientDetail, DatabaseError> {
    let patient = db::get_patient(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Patient".into(),
        id: id.to_string(),
    })?;
    let calculations = db::get_calculations_for_patient(conn, id)?;
    Ok(PatientDetail {
        patient,
        calculations,
    })
}

pub fn get_calculation_detail(
    conn: &Connection,
    id: &Uuid,
) -> Result<CalculationDetail, DatabaseError> {
    let calculation =
        db::get_dose_calculation(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
            entity_type: "DoseCalculation".into(),
            id: id.to_string(),
        })?;
    let reviews = db::get_reviews_for_calculation(conn, id)?;
    Ok(CalculationDetail {
        calculation,
        reviews,
    })
}

fn patient_record(
    profile: &PatientProfile,
    rec: &DoseRecommendation,
    created_at: NaiveDateTime,
) -> Patient {
    Patient {
        id: Uuid::new_v4(),
        name: profile.name.clone(),
        age: profile.age,
        weight_kg: profile.weight_kg,
        height_cm: profile.height_cm,
        medical_condition: profile.medical_condition,
        drug_name: profile.drug_name.clone(),
        severity: profile.severity,
        allergies: profile.allergies.clone(),
        notes: profile.notes.clone(),
        dose: rec.calculated_dose.clone(),
        dose_form: Some(rec.dose_form.clone()),
        frequency: Some(rec.frequency.clone()),
        duration: Some(rec.duration.clone()),
        instructions: Some(rec.instructions.clone()),
        warnings: Some(rec.warnings.clone()),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::pipeline::dosing::MockLlmClient;
    use std::sync::Arc;

    fn submission() -> PatientSubmission {
        PatientSubmission {
            name: Some("Jane Roe".into()),
            age: Some(30),
            weight: Some(70.0),
            height: Some(165.0),
            medical_condition: Some("normal".into()),
            drug_name: Some("Aspirin".into()),
            severity: Some("moderate".into()),
            allergies: None,
            notes: Some("Takes with food".into()),
        }
    }

    fn offline_calculator() -> DoseCalculator {
        DoseCalculator::new(Arc::new(MockLlmClient::failing("offline")))
    }

    #[test]
    fn fallback_submission_is_fully_persisted() {
        let conn = open_memory_database().unwrap();
        let result =
            submit_patient(&conn, &offline_calculator(), submission(), Some("10.1.2.3")).unwrap();

        assert_eq!(result.calculation_method, CalculationMethod::Fallback);
        assert_eq!(result.patient.dose, "420.0 mg");

        let detail = get_patient_detail(&conn, &result.patient.id).unwrap();
        assert_eq!(detail.patient.name, "Jane Roe");
        assert_eq!(detail.calculations.len(), 1);
        let calc = &detail.calculations[0];
        assert_eq!(calc.id, result.calculation_id);
        assert_eq!(calc.calculation_method, CalculationMethod::Fallback);
        assert_eq!(calc.factors.unwrap().final_dose_mg, 420.0);
        assert!(calc.remote_response.is_none());

        let audit = db::recent_audit_entries(&conn, 10).unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].patient_name, "Jane Roe");
        assert_eq!(audit[0].calculated_dose, "420.0 mg");
        assert_eq!(audit[0].calculation_method, CalculationMethod::Fallback);
        assert_eq!(audit[0].user_ip.as_deref(), Some("10.1.2.3"));
    }

    #[test]
    fn remote_submission_keeps_raw_response() {
        let conn = open_memory_database().unwrap();
        let raw = r#"{"calculated_dose": "81 mg", "dose_form": "Tablet", "frequency": "Once daily"}"#;
        let calculator = DoseCalculator::new(Arc::new(MockLlmClient::new(raw)));

        let result = submit_patient(&conn, &calculator, submission(), None).unwrap();
        assert_eq!(result.calculation_method, CalculationMethod::Remote);
        assert_eq!(result.patient.dose, "81 mg");
        assert_eq!(result.patient.frequency.as_deref(), Some("Once daily"));

        let calc = db::get_dose_calculation(&conn, &result.calculation_id).unwrap().unwrap();
        assert_eq!(calc.remote_response.as_deref(), Some(raw));
        assert!(calc.factors.is_none());
    }

    #[test]
    fn calculation_detail_lists_reviews() {
        let conn = open_memory_database().unwrap();
        let calculator = DoseCalculator::new(Arc::new(MockLlmClient::failing("offline")));
        let result = submit_patient(&conn, &calculator, submission(), None).unwrap();

        let review = crate::models::ReviewSubmission {
            expert_name: Some("Dr. Ada".into()),
            verification_status: Some("approved".into()),
            expert_notes: None,
            recommended_dose: None,
        }
        .into_review(result.calculation_id)
        .unwrap();
        db::record_expert_review(&conn, &review).unwrap();

        let detail = get_calculation_detail(&conn, &result.calculation_id).unwrap();
        assert_eq!(detail.calculation.patient_id, result.patient.id);
        assert!(detail.calculation.verified_by_expert);
        assert_eq!(detail.reviews.len(), 1);
        assert_eq!(detail.reviews[0].id, review.id);
        assert_eq!(detail.reviews[0].expert_name, "Dr. Ada");
    }

    #[test]
    fn unknown_calculation_detail_is_not_found() {
        let conn = open_memory_database().unwrap();
        let result = get_calculation_detail(&conn, &Uuid::new_v4());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn invalid_submission_stores_nothing() {
        let conn = open_memory_database().unwrap();
        let bad = PatientSubmission {
            age: Some(200),
            ..submission()
        };
        let err = submit_patient(&conn, &offline_calculator(), bad, None).unwrap_err();
        assert!(matches!(err, SubmitError::Validation(_)));
        assert!(db::list_patients(&conn).unwrap().is_empty());
        assert!(db::recent_audit_entries(&conn, 10).unwrap().is_empty());
    }

    #[test]
    fn unknown_patient_detail_is_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            get_patient_detail(&conn, &Uuid::new_v4()),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
