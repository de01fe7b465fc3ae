use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_enum, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{DoseCalculation, ExpertReview, VerificationStatus};
use crate::pipeline::dosing::{CalculationMethod, DoseFactors};

const CALCULATION_COLUMNS: &str = "id, patient_id, calculation_method, recommendation_json,
     base_dose, age_adjustment_factor, severity_adjustment_factor, condition_adjustment_factor,
     final_calculated_dose, remote_response, verified_by_expert, expert_notes, created_at";

pub fn insert_dose_calculation(
    conn: &Connection,
    calc: &DoseCalculation,
) -> Result<(), DatabaseError> {
    let recommendation_json = serde_json::to_string(&calc.recommendation)?;
    let factors = calc.factors.as_ref();
    conn.execute(
        "INSERT INTO dose_calculations (id, patient_id, calculation_method, recommendation_json,
         base_dose, age_adjustment_factor, severity_adjustment_factor, condition_adjustment_factor,
         final_calculated_dose, remote_response, verified_by_expert, expert_notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            calc.id.to_string(),
            calc.patient_id.to_string(),
            calc.calculation_method.as_str(),
            recommendation_json,
            factors.map(|f| f.base_dose_mg),
            factors.map(|f| f.age_factor),
            factors.map(|f| f.severity_factor),
            factors.map(|f| f.condition_factor),
            factors.map(|f| f.final_dose_mg),
            calc.remote_response,
            calc.verified_by_expert as i32,
            calc.expert_notes,
            format_datetime(&calc.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_dose_calculation(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<DoseCalculation>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {CALCULATION_COLUMNS} FROM dose_calculations WHERE id = ?1"),
            params![id.to_string()],
            calculation_row_from_rusqlite,
        )
        .optional()?;
    row.map(calculation_from_row).transpose()
}

/// Calculations for one patient, oldest first.
pub fn get_calculations_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<DoseCalculation>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CALCULATION_COLUMNS} FROM dose_calculations
         WHERE patient_id = ?1 ORDER BY created_at ASC, rowid ASC"
    ))?;

    let rows = stmt.query_map(params![patient_id.to_string()], calculation_row_from_rusqlite)?;

    let mut calcs = Vec::new();
    for row in rows {
        calcs.push(calculation_from_row(row?)?);
    }
    Ok(calcs)
}

/// Store an expert review and apply it to the reviewed calculation.
///
/// The most recent review decides `verified_by_expert`: approved sets it,
/// any other verdict clears it. Review notes replace the calculation's notes
/// when present.
pub fn record_expert_review(conn: &Connection, review: &ExpertReview) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let updated = tx.execute(
        "UPDATE dose_calculations
         SET verified_by_expert = ?2, expert_notes = COALESCE(?3, expert_notes)
         WHERE id = ?1",
        params![
            review.calculation_id.to_string(),
            (review.verification_status == VerificationStatus::Approved) as i32,
            review.expert_notes,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "DoseCalculation".into(),
            id: review.calculation_id.to_string(),
        });
    }

    tx.execute(
        "INSERT INTO expert_reviews (id, calculation_id, expert_name, verification_status,
         expert_notes, recommended_dose, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            review.id.to_string(),
            review.calculation_id.to_string(),
            review.expert_name,
            review.verification_status.as_str(),
            review.expert_notes,
            review.recommended_dose,
            format_datetime(&review.created_at),
        ],
    )?;

    tx.commit()?;
    Ok(())
}

pub fn get_reviews_for_calculation(
    conn: &Connection,
    calculation_id: &Uuid,
) -> Result<Vec<ExpertReview>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, calculation_id, expert_name, verification_status, expert_notes,
         recommended_dose, created_at
         FROM expert_reviews WHERE calculation_id = ?1 ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![calculation_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut reviews = Vec::new();
    for row in rows {
        let (id, calc_id, expert_name, status, notes, recommended_dose, created_at) = row?;
        reviews.push(ExpertReview {
            id: parse_uuid(&id)?,
            calculation_id: parse_uuid(&calc_id)?,
            expert_name,
            verification_status: parse_enum("verification_status", &status)?,
            expert_notes: notes,
            recommended_dose,
            created_at: parse_datetime(&created_at)?,
        });
    }
    Ok(reviews)
}

struct CalculationRow {
    id: String,
    patient_id: String,
    calculation_method: String,
    recommendation_json: String,
    base_dose: Option<f64>,
    age_factor: Option<f64>,
    severity_factor: Option<f64>,
    condition_factor: Option<f64>,
    final_dose: Option<f64>,
    remote_response: Option<String>,
    verified_by_expert: i32,
    expert_notes: Option<String>,
    created_at: String,
}

fn calculation_row_from_rusqlite(
    row: &rusqlite::Row<'_>,
) -> Result<CalculationRow, rusqlite::Error> {
    Ok(CalculationRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        calculation_method: row.get(2)?,
        recommendation_json: row.get(3)?,
        base_dose: row.get(4)?,
        age_factor: row.get(5)?,
        severity_factor: row.get(6)?,
        condition_factor: row.get(7)?,
        final_dose: row.get(8)?,
        remote_response: row.get(9)?,
        verified_by_expert: row.get(10)?,
        expert_notes: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn calculation_from_row(row: CalculationRow) -> Result<DoseCalculation, DatabaseError> {
    let factors = match (
        row.base_dose,
        row.age_factor,
        row.severity_factor,
        row.condition_factor,
        row.final_dose,
    ) {
        (Some(base), Some(age), Some(severity), Some(condition), Some(final_dose)) => {
            Some(DoseFactors {
                base_dose_mg: base,
                age_factor: age,
                severity_factor: severity,
                condition_factor: condition,
                final_dose_mg: final_dose,
            })
        }
        _ => None,
    };

    Ok(DoseCalculation {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        calculation_method: parse_enum::<CalculationMethod>(
            "calculation_method",
            &row.calculation_method,
        )?,
        recommendation: serde_json::from_str(&row.recommendation_json)?,
        factors,
        remote_response: row.remote_response,
        verified_by_expert: row.verified_by_expert != 0,
        expert_notes: row.expert_notes,
        created_at: parse_datetime(&row.created_at)?,
    })
}
