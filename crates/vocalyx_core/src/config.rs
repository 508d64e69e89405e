//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe tunables for catalog locale, resolver cache, worksheet
//!   placeholders, gateway retries and signup validation.
//! - Load them from JSON with every field defaulted.
//!
//! # Invariants
//! - Invalid values are rejected by `validate()`, never clamped.

use crate::logging::default_log_level;
use crate::model::patient::DEFAULT_LANGUAGE;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry/backoff settings applied at the gateway boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Top-level core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// Locale used for catalog labels and new patient records.
    pub primary_locale: String,
    /// Maximum entries held by the media URL cache.
    pub url_cache_capacity: usize,
    /// Prefix of placeholder image URLs; the file stem is appended.
    pub placeholder_base: String,
    /// Prefix of worksheet placeholder URLs; the encoded filename text is appended.
    pub worksheet_placeholder_base: String,
    /// Default page size for progress-session listings.
    pub progress_list_limit: u32,
    pub min_password_length: usize,
    pub retry: RetryConfig,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            primary_locale: DEFAULT_LANGUAGE.to_string(),
            url_cache_capacity: Self::DEFAULT_URL_CACHE_CAPACITY,
            placeholder_base: "https://via.placeholder.com/200x200?text=".to_string(),
            worksheet_placeholder_base: "https://via.placeholder.com/200x200/ec4899/ffffff?text="
                .to_string(),
            progress_list_limit: 50,
            min_password_length: 6,
            retry: RetryConfig::default(),
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    pub const DEFAULT_URL_CACHE_CAPACITY: usize = 512;

    /// Parses and validates configuration JSON. Missing fields take defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_locale.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "primaryLocale",
                message: "must not be empty".to_string(),
            });
        }
        if self.url_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "urlCacheCapacity",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.worksheet_placeholder_base.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "worksheetPlaceholderBase",
                message: "must not be empty".to_string(),
            });
        }
        if self.progress_list_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "progressListLimit",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "retry.maxAttempts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid {
                field: "retry.baseDelayMs",
                message: format!(
                    "{} exceeds retry.maxDelayMs {}",
                    self.retry.base_delay_ms, self.retry.max_delay_ms
                ),
            });
        }
        Ok(())
    }
}

/// Configuration loading/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid { field, message } => write!(f, "invalid config `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.primary_locale, "en-IN");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config =
            CoreConfig::from_json_str(r#"{"urlCacheCapacity":8,"retry":{"maxAttempts":5}}"#).unwrap();
        assert_eq!(config.url_cache_capacity, 8);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 100);
    }

    #[test]
    fn zero_cache_capacity_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"urlCacheCapacity":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "urlCacheCapacity", .. }));
    }

    #[test]
    fn worksheet_placeholder_base_is_configurable() {
        let config =
            CoreConfig::from_json_str(r#"{"worksheetPlaceholderBase":"https://img.test/?t="}"#).unwrap();
        assert_eq!(config.worksheet_placeholder_base, "https://img.test/?t=");
        let err = CoreConfig::from_json_str(r#"{"worksheetPlaceholderBase":" "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "worksheetPlaceholderBase", .. }));
    }

    #[test]
    fn inverted_retry_delays_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{"retry":{"baseDelayMs":500,"maxDelayMs":10}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("retry.baseDelayMs"));
    }
}
