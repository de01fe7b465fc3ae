use crate::models::PatientProfile;

/// Build the dose-calculation prompt for one patient.
///
/// Pure formatting: the output always lists the eight required answer items
/// and asks for a JSON object with exactly the nine keys the parser expects.
pub fn build_dose_prompt(profile: &PatientProfile) -> String {
    let height = profile
        .height_cm
        .map(|h| format!("{h} cm"))
        .unwrap_or_else(|| "Not provided".to_string());
    let allergies = profile.allergies.as_deref().unwrap_or("None");
    let notes = profile
        .notes
        .as_deref()
        .map(|n| format!("- Additional Notes: {n}\n"))
        .unwrap_or_default();

    format!(
        r#"As a clinical pharmacist, calculate the appropriate drug dosage for the following patient:

Patient Information:
- Age: {age} years
- Weight: {weight} kg
- Height: {height}
- Medical Condition: {condition}
- Drug Requested: {drug}
- Severity: {severity}
- Known Allergies: {allergies}
{notes}
Please provide a comprehensive dosage calculation including:
1. Calculated dose (mg or appropriate unit)
2. Dose form (tablets, syrup, injection, etc.)
3. Frequency (times per day)
4. Duration of treatment
5. Special instructions
6. Warnings and contraindications
7. Available market formulations
8. Alternative drugs if applicable

Consider:
- Age-based dosing adjustments
- Weight-based calculations
- Medical condition interactions
- Severity adjustments
- Standard clinical guidelines
- Available tablet/syrup strengths in the market

Format your response as JSON with the following structure:
{{
    "calculated_dose": "dose with unit",
    "dose_form": "form of medication",
    "frequency": "how often per day",
    "duration": "treatment duration",
    "instructions": "detailed administration instructions",
    "warnings": "important warnings and contraindications",
    "market_formulations": ["available strengths"],
    "alternatives": ["alternative medications if needed"],
    "calculation_breakdown": "explanation of how dose was calculated"
}}
"#,
        age = profile.age,
        weight = profile.weight_kg,
        condition = profile.medical_condition.as_str(),
        drug = profile.drug_name,
        severity = profile.severity.as_str(),
    )
}

/// Build the free-text drug information prompt.
pub fn build_drug_info_prompt(drug_name: &str) -> String {
    format!(
        r#"Provide comprehensive information about the drug: {drug_name}

Include:
1. Generic and brand names
2. Drug class and mechanism of action
3. Common indications
4. Standard dosing ranges
5. Available formulations and strengths
6. Common side effects
7. Contraindications
8. Drug interactions
9. Special populations (pediatric, geriatric, pregnancy)

Format as JSON with appropriate keys.
"#
    )
}
