use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_datetime, map_constraint, parse_datetime, parse_enum, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Drug, DrugFormulation};

const DRUG_COLUMNS: &str = "id, name, generic_name, drug_class, mechanism, indications,
     contraindications, side_effects, interactions, standard_dose_adult,
     standard_dose_pediatric, max_daily_dose, created_at, updated_at";

/// Insert a catalog drug. Names are unique case-insensitively.
pub fn insert_drug(conn: &Connection, drug: &Drug) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO drugs (id, name, generic_name, drug_class, mechanism, indications,
         contraindications, side_effects, interactions, standard_dose_adult,
         standard_dose_pediatric, max_daily_dose, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            drug.id.to_string(),
            drug.name,
            drug.generic_name,
            drug.drug_class,
            drug.mechanism,
            drug.indications,
            drug.contraindications,
            drug.side_effects,
            drug.interactions,
            drug.standard_dose_adult,
            drug.standard_dose_pediatric,
            drug.max_daily_dose,
            format_datetime(&drug.created_at),
            format_datetime(&drug.updated_at),
        ],
    )
    .map_err(|e| map_constraint(e, &format!("drug '{}' already exists", drug.name)))?;
    Ok(())
}

pub fn get_drug(conn: &Connection, id: &Uuid) -> Result<Option<Drug>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {DRUG_COLUMNS} FROM drugs WHERE id = ?1"),
            params![id.to_string()],
            drug_row_from_rusqlite,
        )
        .optional()?;
    row.map(drug_from_row).transpose()
}

/// Catalog sorted by name.
pub fn list_drugs(conn: &Connection) -> Result<Vec<Drug>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRUG_COLUMNS} FROM drugs ORDER BY name COLLATE NOCASE ASC"
    ))?;
    let rows = stmt.query_map([], drug_row_from_rusqlite)?;

    let mut drugs = Vec::new();
    for row in rows {
        drugs.push(drug_from_row(row?)?);
    }
    Ok(drugs)
}

pub fn insert_formulation(conn: &Connection, f: &DrugFormulation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO drug_formulations (id, drug_id, form_type, strength, route, manufacturer,
         market_availability)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            f.id.to_string(),
            f.drug_id.to_string(),
            f.form_type.as_str(),
            f.strength,
            f.route.map(|r| r.as_str()),
            f.manufacturer,
            f.market_availability as i32,
        ],
    )
    .map_err(|e| map_constraint(e, "formulation rejected"))?;
    Ok(())
}

pub fn get_formulations_for_drug(
    conn: &Connection,
    drug_id: &Uuid,
) -> Result<Vec<DrugFormulation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, drug_id, form_type, strength, route, manufacturer, market_availability
         FROM drug_formulations WHERE drug_id = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt
        .query_map(params![drug_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, i32>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, drug_id, form_type, strength, route, manufacturer, available)| -> Result<DrugFormulation, DatabaseError> {
            Ok(DrugFormulation {
                id: parse_uuid(&id)?,
                drug_id: parse_uuid(&drug_id)?,
                form_type: parse_enum("form_type", &form_type)?,
                strength,
                route: route.map(|r| parse_enum("route", &r)).transpose()?,
                manufacturer,
                market_availability: available != 0,
            })
        })
        .collect()
}

struct DrugRow {
    id: String,
    name: String,
    generic_name: Option<String>,
    drug_class: Option<String>,
    mechanism: Option<String>,
    indications: Option<String>,
    contraindications: Option<String>,
    side_effects: Option<String>,
    interactions: Option<String>,
    standard_dose_adult: Option<String>,
    standard_dose_pediatric: Option<String>,
    max_daily_dose: Option<String>,
    created_at: String,
    updated_at: String,
}

fn drug_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DrugRow, rusqlite::Error> {
    Ok(DrugRow {
        id: row.get(0)?,
        name: row.get(1)?,
        generic_name: row.get(2)?,
        drug_class: row.get(3)?,
        mechanism: row.get(4)?,
        indications: row.get(5)?,
        contraindications: row.get(6)?,
        side_effects: row.get(7)?,
        interactions: row.get(8)?,
        standard_dose_adult: row.get(9)?,
        standard_dose_pediatric: row.get(10)?,
        max_daily_dose: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn drug_from_row(row: DrugRow) -> Result<Drug, DatabaseError> {
    Ok(Drug {
        id: parse_uuid(&row.id)?,
        name: row.name,
        generic_name: row.generic_name,
        drug_class: row.drug_class,
        mechanism: row.mechanism,
        indications: row.indications,
        contraindications: row.contraindications,
        side_effects: row.side_effects,
        interactions: row.interactions,
        standard_dose_adult: row.standard_dose_adult,
        standard_dose_pediatric: row.standard_dose_pediatric,
        max_daily_dose: row.max_daily_dose,
        created_at: parse_datetime(&row.created_at)?,
        updated_at: parse_datetime(&row.updated_at)?,
    })
}
