pub mod types;
pub mod prompt;
pub mod parser;
pub mod fallback;
pub mod orchestrator;
pub mod drug_info;
pub mod gemini;
pub mod ollama;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use fallback::*;
pub use orchestrator::*;
pub use drug_info::*;
pub use gemini::*;
pub use ollama::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DosingError {
    #[error("Generation service is not reachable at {0}")]
    RemoteConnection(String),

    #[error("Generation service returned error (status {status}): {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Generation service rejected the credentials")]
    Unauthorized,

    #[error("Generation service quota or rate limit exceeded")]
    RateLimited,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Generation service returned an empty response")]
    EmptyResponse,

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

impl DosingError {
    /// Network, auth, quota and empty-body failures of the remote call.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            DosingError::RemoteConnection(_)
                | DosingError::RemoteStatus { .. }
                | DosingError::Unauthorized
                | DosingError::RateLimited
                | DosingError::HttpClient(_)
                | DosingError::EmptyResponse
                | DosingError::ResponseParsing(_)
        )
    }

    /// The remote text was received but could not be decoded.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, DosingError::JsonParsing(_))
    }
}
