use serde::{Deserialize, Serialize};

use super::DosingError;

/// The nine keys requested from the generation service, in prompt order.
pub const RECOMMENDATION_KEYS: [&str; 9] = [
    "calculated_dose",
    "dose_form",
    "frequency",
    "duration",
    "instructions",
    "warnings",
    "market_formulations",
    "alternatives",
    "calculation_breakdown",
];

pub const DEFAULT_CALCULATED_DOSE: &str = "Consult healthcare provider";
pub const DEFAULT_DOSE_FORM: &str = "As prescribed";
pub const DEFAULT_FREQUENCY: &str = "As directed";
pub const DEFAULT_DURATION: &str = "As prescribed";
pub const DEFAULT_INSTRUCTIONS: &str = "Please consult with a healthcare professional";
pub const DEFAULT_WARNINGS: &str = "Consult healthcare provider before use";

/// A complete dose recommendation. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseRecommendation {
    pub calculated_dose: String,
    pub dose_form: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
    pub warnings: String,
    pub market_formulations: Vec<String>,
    pub alternatives: Vec<String>,
    pub calculation_breakdown: String,
}

impl DoseRecommendation {
    /// Safe human-readable defaults used when the remote text carries no structure.
    pub fn with_defaults(calculation_breakdown: &str) -> Self {
        Self {
            calculated_dose: DEFAULT_CALCULATED_DOSE.into(),
            dose_form: DEFAULT_DOSE_FORM.into(),
            frequency: DEFAULT_FREQUENCY.into(),
            duration: DEFAULT_DURATION.into(),
            instructions: DEFAULT_INSTRUCTIONS.into(),
            warnings: DEFAULT_WARNINGS.into(),
            market_formulations: Vec::new(),
            alternatives: Vec::new(),
            calculation_breakdown: calculation_breakdown.into(),
        }
    }
}

/// Provenance of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// The generation service answered and its text was parsed.
    Remote,
    /// The deterministic weight-based formula was used.
    Fallback,
}

impl CalculationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Fallback => "fallback",
        }
    }
}

impl std::str::FromStr for CalculationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote" => Ok(Self::Remote),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("unknown calculation method: {other}")),
        }
    }
}

/// Multiplicative trace of the fallback formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseFactors {
    pub base_dose_mg: f64,
    pub age_factor: f64,
    pub severity_factor: f64,
    pub condition_factor: f64,
    pub final_dose_mg: f64,
}

/// Result of one dose computation: exactly one recommendation and its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoseOutcome {
    pub recommendation: DoseRecommendation,
    pub method: CalculationMethod,
    /// Raw remote text, when the service answered.
    pub raw_response: Option<String>,
    /// Formula trace, when the fallback path was used.
    pub factors: Option<DoseFactors>,
}

impl DoseOutcome {
    pub fn into_parts(self) -> (DoseRecommendation, CalculationMethod) {
        (self.recommendation, self.method)
    }
}

/// Remote text-generation service abstraction (allows mocking).
pub trait LlmClient {
    /// Send a single prompt and return the full text response.
    fn generate(&self, prompt: &str) -> Result<String, DosingError>;

    /// Name of the model answering prompts.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn defaults_fill_every_field() {
        let rec = DoseRecommendation::with_defaults("raw text");
        assert_eq!(rec.calculated_dose, "Consult healthcare provider");
        assert_eq!(rec.frequency, "As directed");
        assert!(rec.market_formulations.is_empty());
        assert_eq!(rec.calculation_breakdown, "raw text");
    }

    #[test]
    fn recommendation_serializes_all_nine_keys() {
        let json = serde_json::to_value(DoseRecommendation::with_defaults("")).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), RECOMMENDATION_KEYS.len());
        for key in RECOMMENDATION_KEYS {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn method_string_roundtrip() {
        for m in [CalculationMethod::Remote, CalculationMethod::Fallback] {
            assert_eq!(CalculationMethod::from_str(m.as_str()).unwrap(), m);
        }
        assert!(CalculationMethod::from_str("gemini_api").is_err());
        assert_eq!(
            serde_json::to_string(&CalculationMethod::Fallback).unwrap(),
            "\"fallback\""
        );
    }
}
