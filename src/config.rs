//! YAML configuration for the matching engine.
//!
//! ## Example
//!
//! ```yaml
//! version: "1.0"
//! default_page_size: 20
//! max_page_size: 100
//! provider_timeout_ms: 5000
//! parallel_threshold: 2048
//! include_unembedded: true
//! retry:
//!   max_retries: 2
//!   base_delay_ms: 100
//!   max_delay_ms: 2000
//!   jitter: true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rank::{CandidateRanker, DEFAULT_PARALLEL_THRESHOLD};
use crate::retry::RetryConfig;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Page size used when a request leaves it unspecified
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Optional ceiling; larger requests are rejected, not clamped
    #[serde(default)]
    pub max_page_size: Option<usize>,

    /// Deadline for a single embedding-provider call
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Candidate count at which ranking goes parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Rank entries that have no stored embedding at score 0
    #[serde(default = "true_value")]
    pub include_unembedded: bool,

    #[serde(default)]
    pub retry: RetryYamlConfig,
}

impl EngineConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.default_page_size == 0 {
            return Err(ConfigLoadError::Validation(
                "default_page_size must be >= 1".to_string(),
            ));
        }
        if let Some(max) = self.max_page_size {
            if max == 0 {
                return Err(ConfigLoadError::Validation(
                    "max_page_size must be >= 1".to_string(),
                ));
            }
            if self.default_page_size > max {
                return Err(ConfigLoadError::Validation(format!(
                    "default_page_size ({}) exceeds max_page_size ({max})",
                    self.default_page_size
                )));
            }
        }
        if self.provider_timeout_ms == 0 {
            return Err(ConfigLoadError::Validation(
                "provider_timeout_ms must be >= 1".to_string(),
            ));
        }
        if self.parallel_threshold == 0 {
            return Err(ConfigLoadError::Validation(
                "parallel_threshold must be >= 1".to_string(),
            ));
        }
        self.retry.validate()
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn ranker(&self) -> CandidateRanker {
        CandidateRanker::new(self.parallel_threshold, self.include_unembedded)
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry.to_retry_config()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_page_size: default_page_size(),
            max_page_size: None,
            provider_timeout_ms: default_provider_timeout_ms(),
            parallel_threshold: default_parallel_threshold(),
            include_unembedded: true,
            retry: RetryYamlConfig::default(),
        }
    }
}

/// Retry policy as written in YAML; durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryYamlConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "true_value")]
    pub jitter: bool,
}

impl RetryYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigLoadError::Validation(
                "retry.base_delay_ms must be <= retry.max_delay_ms".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::default()
            .with_max_retries(self.max_retries)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_jitter(self.jitter)
    }
}

impl Default for RetryYamlConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: true,
        }
    }
}

// Helper functions for serde defaults
fn default_version() -> String {
    "1.0".to_string()
}
fn default_page_size() -> usize {
    20
}
fn default_provider_timeout_ms() -> u64 {
    5_000
}
fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}
fn default_max_retries() -> u32 {
    2
}
fn default_base_delay_ms() -> u64 {
    100
}
fn default_max_delay_ms() -> u64 {
    2_000
}
fn true_value() -> bool {
    true
}
