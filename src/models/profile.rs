use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::enums::{MedicalCondition, Severity};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const AGE_MAX_YEARS: i64 = 120;
pub const WEIGHT_MIN_KG: f64 = 0.5;
pub const WEIGHT_MAX_KG: f64 = 500.0;
pub const HEIGHT_MIN_CM: f64 = 30.0;
pub const HEIGHT_MAX_CM: f64 = 300.0;
pub const ALLERGIES_MAX_CHARS: usize = 500;
pub const NOTES_MAX_CHARS: usize = 1000;

/// Validated patient attributes fed to the dose pipeline. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub name: String,
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: Option<f64>,
    pub medical_condition: MedicalCondition,
    pub drug_name: String,
    pub severity: Severity,
    pub allergies: Option<String>,
    pub notes: Option<String>,
}

/// Raw form submission, before range and enum checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientSubmission {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub medical_condition: Option<String>,
    pub drug_name: Option<String>,
    pub severity: Option<String>,
    pub allergies: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Out-of-range or missing form fields. Lists every failing field.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid submission: {}", summarize(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ({})", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl PatientSubmission {
    pub fn validate(self) -> Result<PatientProfile, ValidationError> {
        let mut errors = Vec::new();

        let name = required_text(&mut errors, "name", self.name, NAME_MIN_CHARS, NAME_MAX_CHARS);
        let drug_name = required_text(
            &mut errors,
            "drug_name",
            self.drug_name,
            NAME_MIN_CHARS,
            NAME_MAX_CHARS,
        );

        let age = match self.age {
            None => {
                errors.push(required("age"));
                None
            }
            Some(a) if !(0..=AGE_MAX_YEARS).contains(&a) => {
                errors.push(FieldError {
                    field: "age",
                    message: format!("must be between 0 and {AGE_MAX_YEARS}"),
                });
                None
            }
            Some(a) => u32::try_from(a).ok(),
        };

        let weight_kg = match self.weight {
            None => {
                errors.push(required("weight"));
                None
            }
            Some(w) if !w.is_finite() || !(WEIGHT_MIN_KG..=WEIGHT_MAX_KG).contains(&w) => {
                errors.push(FieldError {
                    field: "weight",
                    message: format!("must be between {WEIGHT_MIN_KG} and {WEIGHT_MAX_KG} kg"),
                });
                None
            }
            Some(w) => Some(w),
        };

        let height_cm = match self.height {
            Some(h) if !h.is_finite() || !(HEIGHT_MIN_CM..=HEIGHT_MAX_CM).contains(&h) => {
                errors.push(FieldError {
                    field: "height",
                    message: format!("must be between {HEIGHT_MIN_CM} and {HEIGHT_MAX_CM} cm"),
                });
                None
            }
            other => other,
        };

        let medical_condition = parse_choice::<MedicalCondition>(
            &mut errors,
            "medical_condition",
            self.medical_condition,
        );
        let severity = parse_choice::<Severity>(&mut errors, "severity", self.severity);

        let allergies = optional_text(&mut errors, "allergies", self.allergies, ALLERGIES_MAX_CHARS);
        let notes = optional_text(&mut errors, "notes", self.notes, NOTES_MAX_CHARS);

        match (name, age, weight_kg, medical_condition, drug_name, severity) {
            (Some(name), Some(age), Some(weight_kg), Some(medical_condition), Some(drug_name), Some(severity))
                if errors.is_empty() =>
            {
                Ok(PatientProfile {
                    name,
                    age,
                    weight_kg,
                    height_cm,
                    medical_condition,
                    drug_name,
                    severity,
                    allergies,
                    notes,
                })
            }
            _ => Err(ValidationError { fields: errors }),
        }
    }
}

pub(crate) fn required(field: &'static str) -> FieldError {
    FieldError {
        field,
        message: "is required".into(),
    }
}

pub(crate) fn required_text(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<String>,
    min: usize,
    max: usize,
) -> Option<String> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        errors.push(required(field));
        return None;
    }
    let len = value.chars().count();
    if len < min || len > max {
        errors.push(FieldError {
            field,
            message: format!("must be between {min} and {max} characters"),
        });
        return None;
    }
    Some(value)
}

pub(crate) fn optional_text(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Option<String> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
    if value.chars().count() > max {
        errors.push(FieldError {
            field,
            message: format!("must be at most {max} characters"),
        });
        return None;
    }
    Some(value)
}

pub(crate) fn parse_choice<T: FromStr>(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<String>,
) -> Option<T> {
    let Some(raw) = value.map(|v| v.trim().to_lowercase()).filter(|v| !v.is_empty()) else {
        errors.push(required(field));
        return None;
    };
    match T::from_str(&raw) {
        Ok(v) => Some(v),
        Err(_) => {
            errors.push(FieldError {
                field,
                message: format!("'{raw}' is not a valid choice"),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_submission() -> PatientSubmission {
        PatientSubmission {
            name: Some("Jane Doe".into()),
            age: Some(30),
            weight: Some(70.0),
            height: Some(165.0),
            medical_condition: Some("hypertension".into()),
            drug_name: Some("Amlodipine".into()),
            severity: Some("moderate".into()),
            allergies: Some("Penicillin".into()),
            notes: None,
        }
    }

    #[test]
    fn valid_submission_builds_profile() {
        let profile = valid_submission().validate().unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.age, 30);
        assert_eq!(profile.medical_condition, MedicalCondition::Hypertension);
        assert_eq!(profile.severity, Severity::Moderate);
        assert_eq!(profile.allergies.as_deref(), Some("Penicillin"));
    }

    #[test]
    fn height_and_allergies_are_optional() {
        let profile = PatientSubmission {
            height: None,
            allergies: Some("   ".into()),
            ..valid_submission()
        }
        .validate()
        .unwrap();
        assert!(profile.height_cm.is_none());
        assert!(profile.allergies.is_none());
    }

    #[test]
    fn boundaries_are_inclusive() {
        let profile = PatientSubmission {
            age: Some(0),
            weight: Some(0.5),
            height: Some(300.0),
            ..valid_submission()
        }
        .validate()
        .unwrap();
        assert_eq!(profile.age, 0);
        assert!((profile.weight_kg - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_values_are_all_reported() {
        let err = PatientSubmission {
            age: Some(121),
            weight: Some(0.1),
            height: Some(10.0),
            ..valid_submission()
        }
        .validate()
        .unwrap_err();
        let fields: Vec<_> = err.fields.iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["age", "weight", "height"]);
    }

    #[test]
    fn unknown_choices_are_rejected() {
        let err = PatientSubmission {
            medical_condition: Some("flu".into()),
            severity: Some("extreme".into()),
            ..valid_submission()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.fields.len(), 2);
        assert!(err.to_string().contains("medical_condition"));
    }

    #[test]
    fn choices_are_case_insensitive() {
        let profile = PatientSubmission {
            severity: Some("Critical".into()),
            ..valid_submission()
        }
        .validate()
        .unwrap();
        assert_eq!(profile.severity, Severity::Critical);
    }

    #[test]
    fn missing_required_fields() {
        let err = PatientSubmission::default().validate().unwrap_err();
        let fields: Vec<_> = err.fields.iter().map(|f| f.field).collect();
        for f in ["name", "drug_name", "age", "weight", "medical_condition", "severity"] {
            assert!(fields.contains(&f), "missing error for {f}");
        }
    }

    #[test]
    fn short_name_rejected() {
        let err = PatientSubmission {
            name: Some("J".into()),
            ..valid_submission()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.fields[0].field, "name");
    }
}
