use std::sync::Arc;

use super::fallback::fallback_for_profile;
use super::parser::parse_dose_response;
use super::prompt::build_dose_prompt;
use super::types::{CalculationMethod, DoseOutcome, LlmClient};
use super::DosingError;
use crate::models::PatientProfile;

/// Produces exactly one recommendation per profile:
/// prompt → remote generation → parse, falling back to the formula on any failure.
#[derive(Clone)]
pub struct DoseCalculator {
    llm: Arc<dyn LlmClient + Send + Sync>,
}

impl DoseCalculator {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self { llm }
    }

    /// Compute a recommendation. Never returns an error; failures select the fallback.
    pub fn compute_dose(&self, profile: &PatientProfile) -> DoseOutcome {
        let _span = tracing::info_span!(
            "compute_dose",
            drug = %profile.drug_name,
            model = %self.llm.model_name(),
        )
        .entered();

        let prompt = build_dose_prompt(profile);

        let raw_response = match self.llm.generate(&prompt) {
            Ok(text) => text,
            Err(e) => return self.fallback(profile, None, &e),
        };

        match parse_dose_response(&raw_response) {
            Ok(recommendation) => {
                tracing::info!(
                    method = CalculationMethod::Remote.as_str(),
                    dose = %recommendation.calculated_dose,
                    "Dose computed from generation service"
                );
                DoseOutcome {
                    recommendation,
                    method: CalculationMethod::Remote,
                    raw_response: Some(raw_response),
                    factors: None,
                }
            }
            Err(e) => self.fallback(profile, Some(raw_response), &e),
        }
    }

    fn fallback(
        &self,
        profile: &PatientProfile,
        raw_response: Option<String>,
        cause: &DosingError,
    ) -> DoseOutcome {
        let kind = if cause.is_parse_failure() {
            "parse"
        } else {
            "remote"
        };
        tracing::warn!(error = %cause, kind, "Dose generation failed, using fallback formula");

        let (recommendation, factors) = fallback_for_profile(profile);
        DoseOutcome {
            recommendation,
            method: CalculationMethod::Fallback,
            raw_response,
            factors: Some(factors),
        }
    }
}
