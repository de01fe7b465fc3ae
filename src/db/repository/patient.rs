use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_enum, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Patient, PatientExport};

const PATIENT_COLUMNS: &str = "id, name, age, weight, height, medical_condition, drug_name, severity,
     allergies, notes, dose, dose_form, frequency, duration, instructions, warnings, created_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, age, weight, height, medical_condition, drug_name, severity,
         allergies, notes, dose, dose_form, frequency, duration, instructions, warnings, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.weight_kg,
            patient.height_cm,
            patient.medical_condition.as_str(),
            patient.drug_name,
            patient.severity.as_str(),
            patient.allergies,
            patient.notes,
            patient.dose,
            patient.dose_form,
            patient.frequency,
            patient.duration,
            patient.instructions,
            patient.warnings,
            format_datetime(&patient.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![id.to_string()],
            patient_row_from_rusqlite,
        )
        .optional()?;
    row.map(patient_from_row).transpose()
}

/// All patients, newest first.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map([], patient_row_from_rusqlite)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

pub fn export_patients(conn: &Connection) -> Result<Vec<PatientExport>, DatabaseError> {
    Ok(list_patients(conn)?.iter().map(PatientExport::from).collect())
}

struct PatientRow {
    id: String,
    name: String,
    age: u32,
    weight: f64,
    height: Option<f64>,
    medical_condition: String,
    drug_name: String,
    severity: String,
    allergies: Option<String>,
    notes: Option<String>,
    dose: String,
    dose_form: Option<String>,
    frequency: Option<String>,
    duration: Option<String>,
    instructions: Option<String>,
    warnings: Option<String>,
    created_at: String,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        weight: row.get(3)?,
        height: row.get(4)?,
        medical_condition: row.get(5)?,
        drug_name: row.get(6)?,
        severity: row.get(7)?,
        allergies: row.get(8)?,
        notes: row.get(9)?,
        dose: row.get(10)?,
        dose_form: row.get(11)?,
        frequency: row.get(12)?,
        duration: row.get(13)?,
        instructions: row.get(14)?,
        warnings: row.get(15)?,
        created_at: row.get(16)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid(&row.id)?,
        name: row.name,
        age: row.age,
        weight_kg: row.weight,
        height_cm: row.height,
        medical_condition: parse_enum("medical_condition", &row.medical_condition)?,
        drug_name: row.drug_name,
        severity: parse_enum("severity", &row.severity)?,
        allergies: row.allergies,
        notes: row.notes,
        dose: row.dose,
        dose_form: row.dose_form,
        frequency: row.frequency,
        duration: row.duration,
        instructions: row.instructions,
        warnings: row.warnings,
        created_at: parse_datetime(&row.created_at)?,
    })
}
