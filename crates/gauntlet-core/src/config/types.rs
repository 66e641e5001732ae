//! Sub-configuration structs with engine defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Remote endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`)
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model used for text-modality cases
    pub text_model: String,

    /// Model used for image-modality cases
    pub image_model: String,

    /// Maximum tokens to request per completion
    pub max_tokens: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: "${GAUNTLET_API_KEY}".to_string(),
            text_model: "gpt-4o-mini".to_string(),
            image_model: "gpt-4o-mini".to_string(),
            max_tokens: 16384,
        }
    }
}

/// Dispatch and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum concurrent in-flight API calls (1-30)
    pub max_workers: usize,

    /// Max retry attempts per case after the initial attempt
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    pub max_delay_ms: u64,

    /// Per-attempt request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_workers: 5,
            max_retries: 3,
            base_delay_ms: 2000,
            max_delay_ms: 30_000,
            request_timeout_secs: 120,
        }
    }
}

/// Result output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory where per-case records and payload files are written
    pub dir: PathBuf,

    /// Pretty-print persisted JSON records
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./gauntlet-results"),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
