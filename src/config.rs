use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::pipeline::dosing::{
    DosingError, GeminiClient, LlmClient, OllamaClient, GEMINI_DEFAULT_MODEL, GEMINI_DEFAULT_URL,
    OLLAMA_DEFAULT_MODEL, OLLAMA_DEFAULT_URL,
};

/// Application-level constants
pub const APP_NAME: &str = "Dosecalc";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5002";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "dosecalc_lib=info,tower_http=info"
}

/// Get the application data directory: ~/Dosecalc/
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite file location.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("database.db")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot build LLM client: {0}")]
    Client(#[from] DosingError),
}

/// Which remote generation service answers prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_DEFAULT_MODEL,
            Self::Ollama => OLLAMA_DEFAULT_MODEL,
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_DEFAULT_URL,
            Self::Ollama => OLLAMA_DEFAULT_URL,
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            _ => Err("expected 'gemini' or 'ollama'".into()),
        }
    }
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm_provider: LlmProvider,
    pub llm_model: String,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_timeout_secs: u64,
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_provider = match get("DOSECALC_LLM_PROVIDER") {
            Some(v) => v.parse::<LlmProvider>().map_err(|reason| ConfigError::InvalidValue {
                var: "DOSECALC_LLM_PROVIDER",
                value: v.clone(),
                reason,
            })?,
            None => LlmProvider::Gemini,
        };

        let llm_timeout_secs = match get("DOSECALC_LLM_TIMEOUT_SECS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        var: "DOSECALC_LLM_TIMEOUT_SECS",
                        value: v,
                        reason: "must be positive".into(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        var: "DOSECALC_LLM_TIMEOUT_SECS",
                        value: v,
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_LLM_TIMEOUT_SECS,
        };

        let bind_raw = get("DOSECALC_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                var: "DOSECALC_BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            llm_model: get("DOSECALC_LLM_MODEL")
                .unwrap_or_else(|| llm_provider.default_model().into()),
            llm_base_url: get("DOSECALC_LLM_BASE_URL")
                .unwrap_or_else(|| llm_provider.default_base_url().into()),
            llm_api_key: get("GEMINI_API_KEY"),
            llm_provider,
            llm_timeout_secs,
            db_path: get("DOSECALC_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            bind_addr,
        })
    }
}

/// Build the configured remote client.
///
/// Uses `reqwest::blocking`, so this must run outside any async runtime.
/// A missing Gemini key is not an error: every call then fails as
/// unauthorized and dose requests use the fallback formula.
pub fn build_llm_client(
    config: &AppConfig,
) -> Result<Arc<dyn LlmClient + Send + Sync>, ConfigError> {
    let client: Arc<dyn LlmClient + Send + Sync> = match config.llm_provider {
        LlmProvider::Gemini => {
            if config.llm_api_key.is_none() {
                tracing::warn!("GEMINI_API_KEY is not set; dose requests will use the fallback formula");
            }
            Arc::new(GeminiClient::new(
                &config.llm_base_url,
                &config.llm_model,
                config.llm_api_key.as_deref().unwrap_or_default(),
                config.llm_timeout_secs,
            )?)
        }
        LlmProvider::Ollama => Arc::new(OllamaClient::new(
            &config.llm_base_url,
            &config.llm_model,
            config.llm_timeout_secs,
        )?),
    };
    tracing::info!(
        provider = config.llm_provider.as_str(),
        model = %config.llm_model,
        timeout_secs = config.llm_timeout_secs,
        "LLM client configured"
    );
    Ok(client)
}
