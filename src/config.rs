//! Configuration — environment-driven service settings.

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmBackend;

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port for the WebSocket + REST server.
    pub port: u16,
    /// Path to the local student database file.
    pub db_path: String,
    /// Which LLM backend serves the assistant side-channel.
    pub llm_backend: LlmBackend,
    /// Model identifier for the assistant.
    pub model: String,
    /// API key for the selected backend.
    pub api_key: SecretString,
    /// Transcription endpoint (OpenAI-compatible `/audio/transcriptions`).
    pub stt_endpoint: String,
    /// Model name passed to the transcription endpoint.
    pub stt_model: String,
    /// Optional bearer token for the transcription endpoint.
    pub stt_api_key: Option<SecretString>,
}

impl AppConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let llm_backend: LlmBackend = std::env::var("ENROLL_ASSIST_LLM")
            .unwrap_or_else(|_| "anthropic".to_string())
            .parse()?;

        let key_var = match llm_backend {
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
        };
        let api_key = std::env::var(key_var)
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = std::env::var("ENROLL_ASSIST_MODEL").unwrap_or_else(|_| {
            match llm_backend {
                LlmBackend::Anthropic => "claude-sonnet-4-20250514",
                LlmBackend::OpenAi => "gpt-4o",
            }
            .to_string()
        });

        let port = std::env::var("ENROLL_ASSIST_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "ENROLL_ASSIST_PORT".to_string(),
                message: format!("{e}"),
            })?;

        Ok(Self {
            port,
            db_path: std::env::var("ENROLL_ASSIST_DB_PATH")
                .unwrap_or_else(|_| "./data/enroll-assist.db".to_string()),
            llm_backend,
            model,
            api_key,
            stt_endpoint: std::env::var("ENROLL_ASSIST_STT_URL").unwrap_or_else(|_| {
                "http://127.0.0.1:8000/v1/audio/transcriptions".to_string()
            }),
            stt_model: std::env::var("ENROLL_ASSIST_STT_MODEL")
                .unwrap_or_else(|_| "whisper-1".to_string()),
            stt_api_key: std::env::var("ENROLL_ASSIST_STT_API_KEY")
                .ok()
                .map(SecretString::from),
        })
    }
}
