use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::DosingError;

pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";
pub const OLLAMA_DEFAULT_MODEL: &str = "medgemma";

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient. Every request is bounded by `timeout_secs`.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, DosingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DosingError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, prompt: &str) -> Result<String, DosingError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        let response = check_status(response)?;

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| DosingError::ResponseParsing(e.to_string()))?;

        if parsed.response.trim().is_empty() {
            return Err(DosingError::EmptyResponse);
        }
        Ok(parsed.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Map a transport error onto the pipeline's remote failure kinds.
pub(crate) fn map_send_error(e: reqwest::Error, base_url: &str, timeout_secs: u64) -> DosingError {
    if e.is_timeout() {
        DosingError::HttpClient(format!("Request timed out after {timeout_secs}s"))
    } else if e.is_connect() {
        DosingError::RemoteConnection(base_url.to_string())
    } else {
        DosingError::HttpClient(e.to_string())
    }
}

/// Turn non-2xx statuses into typed errors; auth and quota get their own kinds.
pub(crate) fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, DosingError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status.as_u16() {
        401 | 403 => Err(DosingError::Unauthorized),
        429 => Err(DosingError::RateLimited),
        code => {
            let body = response.text().unwrap_or_default();
            Err(DosingError::RemoteStatus { status: code, body })
        }
    }
}

/// Mock LLM client for testing: returns a configurable response.
pub struct MockLlmClient {
    response: Result<String, String>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
        }
    }

    /// A client whose every call fails with a connection error.
    pub fn failing(reason: &str) -> Self {
        Self {
            response: Err(reason.to_string()),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _prompt: &str) -> Result<String, DosingError> {
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(DosingError::RemoteConnection(reason.clone())),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
