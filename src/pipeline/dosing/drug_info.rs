use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::prompt::build_drug_info_prompt;
use super::types::LlmClient;

/// Free-text drug information, or the reason it could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrugInfo {
    Information { information: String },
    Error { error: String },
}

/// Pass-through lookup against the generation service. No parsing, no fallback.
#[derive(Clone)]
pub struct DrugInfoLookup {
    llm: Arc<dyn LlmClient + Send + Sync>,
}

impl DrugInfoLookup {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self { llm }
    }

    pub fn lookup(&self, drug_name: &str) -> DrugInfo {
        let prompt = build_drug_info_prompt(drug_name);
        match self.llm.generate(&prompt) {
            Ok(information) => {
                tracing::debug!(drug = %drug_name, chars = information.len(), "Drug information fetched");
                DrugInfo::Information { information }
            }
            Err(e) => {
                tracing::warn!(drug = %drug_name, error = %e, "Drug information lookup failed");
                DrugInfo::Error {
                    error: format!("Unable to fetch drug information: {e}"),
                }
            }
        }
    }
}
