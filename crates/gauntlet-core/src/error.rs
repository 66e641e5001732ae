//! Error types for the Gauntlet benchmarking engine.
//!
//! `ApiError` is the failure descriptor produced at the HTTP adapter
//! boundary; everything the remote endpoint can do wrong is converted into
//! one of its variants before it crosses into the retry loop.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Gauntlet operations.
#[derive(Error, Debug)]
pub enum GauntletError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Test-case catalog errors
    #[error("Catalog error for {path}: {message}")]
    Catalog { path: PathBuf, message: String },

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// A single API attempt failure, classified by how it happened.
///
/// The adapter never lets a raw `reqwest` or parse error escape; every
/// failure mode lands in exactly one of these variants so the classifier
/// can make a retry decision from structure, not string matching.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// The request did not complete within the per-attempt timeout
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Connection-level failure (refused, reset, DNS, TLS)
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// The endpoint answered with a non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Response arrived but violated the expected schema, or some other
    /// non-transport failure occurred
    #[error("Application error: {message}")]
    Application { message: String },
}

impl ApiError {
    /// Short label used in attempt records and progress events.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ApiError::Timeout { .. } => "timeout",
            ApiError::Connection { .. } => "connection-error",
            ApiError::Http { .. } => "http-error",
            ApiError::Application { .. } => "application-error",
        }
    }
}

/// Convenience type alias for Gauntlet results.
pub type Result<T> = std::result::Result<T, GauntletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_status() {
        let err = ApiError::Http {
            status: 503,
            message: "service unavailable".to_string(),
        };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ApiError::Timeout { timeout_secs: 30 }.kind_label(), "timeout");
        assert_eq!(
            ApiError::Connection {
                message: String::new()
            }
            .kind_label(),
            "connection-error"
        );
    }
}
