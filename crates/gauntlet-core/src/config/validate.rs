//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.api.endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.endpoint must not be empty".into(),
            ));
        }
        if !(1..=30).contains(&self.engine.max_workers) {
            return Err(ConfigError::ValidationError(
                "engine.max_workers must be between 1 and 30".into(),
            ));
        }
        if self.engine.base_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "engine.base_delay_ms must be > 0".into(),
            ));
        }
        if self.engine.max_delay_ms < self.engine.base_delay_ms {
            return Err(ConfigError::ValidationError(
                "engine.max_delay_ms must be >= engine.base_delay_ms".into(),
            ));
        }
        if self.engine.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "engine.request_timeout_secs must be > 0".into(),
            ));
        }
        if self.api.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "api.max_tokens must be > 0".into(),
            ));
        }
        Ok(())
    }
}
