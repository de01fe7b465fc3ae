use super::types::{DoseFactors, DoseRecommendation};
use crate::models::PatientProfile;

/// Conservative base dose per kilogram of body weight.
const BASE_MG_PER_KG: f64 = 5.0;

const PEDIATRIC_AGE_LIMIT: u32 = 12;
const GERIATRIC_AGE_LIMIT: u32 = 65;
const PEDIATRIC_FACTOR: f64 = 0.5;
const GERIATRIC_FACTOR: f64 = 0.8;

/// Severity multipliers; anything else (e.g. "critical") is 1.0.
const SEVERITY_FACTORS: &[(&str, f64)] = &[("mild", 1.0), ("moderate", 1.2), ("severe", 1.5)];

/// Organ-condition multipliers, checked in order. First substring match wins.
const CONDITION_FACTORS: &[(&str, f64)] = &[("kidney", 0.7), ("liver", 0.6), ("heart", 0.8)];

/// Deterministic fallback recommendation for a validated profile.
pub fn fallback_for_profile(profile: &PatientProfile) -> (DoseRecommendation, DoseFactors) {
    let factors = compute_fallback_factors(
        profile.weight_kg,
        profile.age,
        profile.medical_condition.as_str(),
        profile.severity.as_str(),
    );
    (recommendation_from_factors(profile.weight_kg, &factors), factors)
}

/// Weight/age/severity/condition dose estimate. `drug_name` is not used numerically.
pub fn fallback_dose_calculation(
    weight_kg: f64,
    age: u32,
    medical_condition: &str,
    _drug_name: &str,
    severity: &str,
) -> DoseRecommendation {
    let factors = compute_fallback_factors(weight_kg, age, medical_condition, severity);
    recommendation_from_factors(weight_kg, &factors)
}

/// Apply the formula in fixed order: base, age band, severity, condition.
pub fn compute_fallback_factors(
    weight_kg: f64,
    age: u32,
    medical_condition: &str,
    severity: &str,
) -> DoseFactors {
    let base_dose_mg = weight_kg * BASE_MG_PER_KG;
    let age_factor = age_factor(age);
    let severity_factor = severity_factor(severity);
    let condition_factor = condition_factor(medical_condition);

    let mut dose = base_dose_mg;
    dose *= age_factor;
    dose *= severity_factor;
    dose *= condition_factor;

    DoseFactors {
        base_dose_mg,
        age_factor,
        severity_factor,
        condition_factor,
        final_dose_mg: round_2dp(dose),
    }
}

pub fn age_factor(age: u32) -> f64 {
    if age < PEDIATRIC_AGE_LIMIT {
        PEDIATRIC_FACTOR
    } else if age > GERIATRIC_AGE_LIMIT {
        GERIATRIC_FACTOR
    } else {
        1.0
    }
}

pub fn severity_factor(severity: &str) -> f64 {
    let lower = severity.trim().to_lowercase();
    SEVERITY_FACTORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, f)| *f)
        .unwrap_or(1.0)
}

pub fn condition_factor(medical_condition: &str) -> f64 {
    let lower = medical_condition.to_lowercase();
    CONDITION_FACTORS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, f)| *f)
        .unwrap_or(1.0)
}

fn recommendation_from_factors(weight_kg: f64, factors: &DoseFactors) -> DoseRecommendation {
    DoseRecommendation {
        calculated_dose: format!("{} mg", format_decimal(factors.final_dose_mg)),
        dose_form: "Tablet/Capsule".into(),
        frequency: "2-3 times per day".into(),
        duration: "As prescribed by physician".into(),
        instructions: "Take with food. Consult healthcare provider for exact dosing.".into(),
        warnings: "This is a basic calculation. Please consult a healthcare professional."
            .into(),
        market_formulations: vec!["Various strengths available".into()],
        alternatives: vec!["Consult pharmacist for alternatives".into()],
        calculation_breakdown: format!(
            "Basic calculation: {}kg × 5mg/kg with adjustments for age and condition \
             (age ×{}, severity ×{}, condition ×{})",
            format_decimal(weight_kg),
            format_decimal(factors.age_factor),
            format_decimal(factors.severity_factor),
            format_decimal(factors.condition_factor),
        ),
    }
}

/// Round to two places on the exact binary value, ties to even ("3.125" -> 3.12).
fn round_2dp(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Shortest decimal rendering that always keeps a fractional part ("420.0", "52.5").
pub fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
