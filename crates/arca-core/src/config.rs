//! Facade configuration
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```toml
//! default_max_retries = 5
//! default_retry_delay = "1m30s"
//! default_tls_verify = true
//! default_media_type = "application/octet-stream"
//!
//! [log]
//! level = "debug"
//! json = false
//! ```

use crate::telemetry::LogConfig;
use arca_artifact::DEFAULT_BLOB_MEDIA_TYPE;
use arca_sync::{parse_duration, RetryDefaults, DEFAULT_MAX_RETRIES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("reading {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid TOML for this schema
    #[error("parsing configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but are unusable
    #[error("{0}")]
    Invalid(String),
}

/// Arca configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcaConfig {
    /// Retries when a push/pull leaves `max_retries` unset
    pub default_max_retries: u32,
    /// Fixed retry delay; unset means exponential backoff from 1s
    pub default_retry_delay: Option<String>,
    /// TLS verification when a push/pull leaves it unset
    pub default_tls_verify: bool,
    /// Media type of added files when no file type is given
    pub default_media_type: String,
    pub log: LogConfig,
}

impl Default for ArcaConfig {
    fn default() -> Self {
        Self {
            default_max_retries: DEFAULT_MAX_RETRIES,
            default_retry_delay: None,
            default_tls_verify: true,
            default_media_type: DEFAULT_BLOB_MEDIA_TYPE.to_string(),
            log: LogConfig::default(),
        }
    }
}

impl ArcaConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// `ConfigError::Parse` for malformed TOML, `ConfigError::Invalid` for
    /// unusable values
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Read` if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Check values that serde cannot
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first bad value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(delay) = &self.default_retry_delay {
            parse_duration(delay).map_err(|reason| {
                ConfigError::Invalid(format!("default_retry_delay {delay:?}: {reason}"))
            })?;
        }
        if self.default_media_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_media_type must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// With default retry count
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.default_max_retries = retries;
        self
    }

    /// With fixed default retry delay
    #[inline]
    #[must_use]
    pub fn with_retry_delay(mut self, delay: impl Into<String>) -> Self {
        self.default_retry_delay = Some(delay.into());
        self
    }

    /// With default TLS verification
    #[inline]
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.default_tls_verify = verify;
        self
    }

    /// With default media type for added files
    #[inline]
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.default_media_type = media_type.into();
        self
    }

    /// With logging settings
    #[inline]
    #[must_use]
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Retry fallbacks for the sync engine
    #[must_use]
    pub fn retry_defaults(&self) -> RetryDefaults {
        RetryDefaults {
            max_retries: self.default_max_retries,
            retry_delay: self.default_retry_delay.clone(),
        }
    }
}
