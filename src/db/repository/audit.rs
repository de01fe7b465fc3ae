use rusqlite::{params, Connection};

use super::{format_datetime, parse_datetime, parse_enum};
use crate::db::DatabaseError;
use crate::models::AuditEntry;
use crate::pipeline::dosing::CalculationMethod;

/// Append one audit row and return its id.
pub fn insert_audit_entry(
    conn: &Connection,
    patient_name: &str,
    drug_name: &str,
    calculated_dose: &str,
    method: CalculationMethod,
    user_ip: Option<&str>,
    timestamp: &chrono::NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (patient_name, drug_name, calculated_dose, calculation_method, user_ip, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            patient_name,
            drug_name,
            calculated_dose,
            method.as_str(),
            user_ip,
            format_datetime(timestamp),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent audit entries, newest first.
pub fn recent_audit_entries(conn: &Connection, limit: u32) -> Result<Vec<AuditEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_name, drug_name, calculated_dose, calculation_method, user_ip, timestamp
         FROM audit_log ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, patient_name, drug_name, calculated_dose, method, user_ip, timestamp)| -> Result<AuditEntry, DatabaseError> {
            Ok(AuditEntry {
                id,
                patient_name,
                drug_name,
                calculated_dose,
                calculation_method: parse_enum("calculation_method", &method)?,
                user_ip,
                timestamp: parse_datetime(&timestamp)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn now() -> chrono::NaiveDateTime {
        chrono::NaiveDateTime::parse_from_str("2025-04-02 16:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn insert_returns_increasing_ids() {
        let conn = open_memory_database().unwrap();
        let a = insert_audit_entry(&conn, "A", "Aspirin", "420.0 mg", CalculationMethod::Fallback, None, &now()).unwrap();
        let b = insert_audit_entry(&conn, "B", "Aspirin", "81 mg", CalculationMethod::Remote, Some("10.0.0.1"), &now()).unwrap();
        assert!(b > a);
    }

    #[test]
    fn recent_entries_newest_first_and_limited() {
        let conn = open_memory_database().unwrap();
        for i in 0..5 {
            insert_audit_entry(
                &conn,
                &format!("Patient {i}"),
                "Ibuprofen",
                "400 mg",
                CalculationMethod::Remote,
                Some("127.0.0.1"),
                &now(),
            )
            .unwrap();
        }

        let entries = recent_audit_entries(&conn, 3).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].patient_name, "Patient 4");
        assert_eq!(entries[2].patient_name, "Patient 2");
        assert_eq!(entries[0].user_ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(entries[0].calculation_method, CalculationMethod::Remote);
    }

    #[test]
    fn empty_log() {
        let conn = open_memory_database().unwrap();
        assert!(recent_audit_entries(&conn, 50).unwrap().is_empty());
    }
}
