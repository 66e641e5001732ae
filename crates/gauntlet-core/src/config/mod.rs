//! Configuration management for Gauntlet.
//!
//! Configuration is loaded from a platform config dir with sensible
//! defaults. The loaded `Config` is read-only for the duration of a run;
//! no component mutates engine settings after startup.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Gauntlet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote endpoint settings
    pub api: ApiConfig,

    /// Dispatch and retry settings
    pub engine: EngineSettings,

    /// Result output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.gauntlet.gauntlet/config.toml
    /// - Linux: ~/.config/gauntlet/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\gauntlet\config\config.toml
    ///
    /// Falls back to ~/.gauntlet/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "gauntlet", "gauntlet")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".gauntlet").join("config.toml")
            })
    }

    /// Get the resolved output directory path (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        let path_str = self.output.dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Resolve the API credential, honoring `${ENV_VAR}` references.
    pub fn resolved_api_key(&self) -> Result<String, ConfigError> {
        resolve_env_var(&self.api.api_key).ok_or_else(|| {
            ConfigError::ValidationError(
                "api.api_key not set. Set the referenced environment variable \
                 or put the key in the config file."
                    .to_string(),
            )
        })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.max_workers, 5);
        assert_eq!(config.engine.max_retries, 3);
        assert_eq!(config.engine.base_delay_ms, 2000);
        assert_eq!(config.engine.max_delay_ms, 30_000);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[api]"));
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("[output]"));
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }

    #[test]
    fn test_load_from_round_trip() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.engine.max_workers, config.engine.max_workers);
        assert_eq!(loaded.api.endpoint, config.api.endpoint);
    }
}
