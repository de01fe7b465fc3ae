//! Repository layer: entity-scoped database operations.
//! All public functions are re-exported here.

mod audit;
mod calculation;
mod drug;
mod patient;

use std::str::FromStr;

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::DatabaseError;

pub use audit::*;
pub use calculation::*;
pub use drug::*;
pub use patient::*;

/// Storage format for every timestamp column.
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_datetime(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid timestamp '{s}': {e}")))
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

/// Parse a stored enum column, naming the column on failure.
pub(crate) fn parse_enum<T: FromStr>(field: &str, value: &str) -> Result<T, DatabaseError> {
    T::from_str(value).map_err(|_| DatabaseError::InvalidEnum {
        field: field.into(),
        value: value.into(),
    })
}

/// Map SQLite constraint failures onto `ConstraintViolation`; pass everything else through.
pub(crate) fn map_constraint(e: rusqlite::Error, what: &str) -> DatabaseError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!("{what}: {e}"))
        }
        _ => DatabaseError::Sqlite(e),
    }
}
