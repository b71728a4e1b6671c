//! Configuration management for toolcast
//!
//! Settings load from environment variables with sensible defaults.
//!
//! # Environment Variables
//!
//! - `TOOLCAST_NAMESPACE`: Tool id namespace prefix - default: "tools"
//! - `TOOLCAST_PROVIDER`: Classifier provider (ollama|openai|anthropic|gemini|xai|groq)
//!   - unset means rules-only classification
//! - `TOOLCAST_MODEL`: Model name - default: "qwen2.5:7b" for Ollama
//! - `TOOLCAST_CLASSIFIER_TIMEOUT`: Classifier timeout in seconds - default: "15"
//! - `TOOLCAST_FEED_TIMEOUT`: Feed call timeout in seconds - default: "10"
//! - `TOOLCAST_REFRESH_INTERVAL`: Registry freshness window in seconds - default: "3600"
//! - `TOOLCAST_LOG_LEVEL`: Logging level - default: "info"
//!
//! Provider credentials are read directly by the genai library
//! (`OLLAMA_HOST`, `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, and so on).

use crate::intent::{Classifier, GenAiClassifier};
use genai::adapter::AdapterKind;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_NAMESPACE: &str = "tools";
const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:7b";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 15;
const DEFAULT_FEED_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid provider name
    #[error("Invalid provider: {0}. Valid options: ollama, openai, anthropic, gemini, xai, groq")]
    InvalidProvider(String),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Runtime configuration, loaded from `TOOLCAST_*` environment variables
#[derive(Debug, Clone)]
pub struct ToolcastConfig {
    /// Namespace prefix for qualified tool ids
    pub namespace: String,

    /// Classifier provider; `None` runs rules-only
    pub provider: Option<AdapterKind>,

    /// Model name for the classifier (provider-specific)
    pub model: String,

    /// Classifier call timeout in seconds
    pub classifier_timeout_secs: u64,

    /// Feed call timeout in seconds
    pub feed_timeout_secs: u64,

    /// Registry freshness window in seconds
    pub refresh_interval_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ToolcastConfig {
    /// Loads from `TOOLCAST_*` environment variables with defaults.
    ///
    /// An unrecognized `TOOLCAST_PROVIDER` value is treated as unset here;
    /// use [`ToolcastConfig::from_env`] to surface it as an error.
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|_| Self::base_from_env())
    }
}

impl ToolcastConfig {
    /// Loads from environment variables, failing on an unrecognized provider
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::base_from_env();
        if let Some(raw) = env::var("TOOLCAST_PROVIDER").ok().filter(|s| !s.is_empty()) {
            let provider = AdapterKind::from_lower_str(&raw.to_lowercase())
                .ok_or(ConfigError::InvalidProvider(raw))?;
            config.provider = Some(provider);
        }
        Ok(config)
    }

    fn base_from_env() -> Self {
        let namespace =
            env::var("TOOLCAST_NAMESPACE").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());

        let model =
            env::var("TOOLCAST_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());

        let classifier_timeout_secs = env::var("TOOLCAST_CLASSIFIER_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT_SECS);

        let feed_timeout_secs = env::var("TOOLCAST_FEED_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FEED_TIMEOUT_SECS);

        let refresh_interval_secs = env::var("TOOLCAST_REFRESH_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);

        let log_level = env::var("TOOLCAST_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            namespace,
            provider: None,
            model,
            classifier_timeout_secs,
            feed_timeout_secs,
            refresh_interval_secs,
            log_level,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() || !self.namespace.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Namespace must be non-empty and alphanumeric, got '{}'",
                self.namespace
            )));
        }

        if self.classifier_timeout_secs == 0 || self.classifier_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Classifier timeout must be between 1 second and 10 minutes".to_string(),
            ));
        }

        if self.feed_timeout_secs == 0 || self.feed_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Feed timeout must be between 1 second and 10 minutes".to_string(),
            ));
        }

        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Refresh interval must be at least 1 second".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier_timeout_secs)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Builds the configured classifier backend, or `None` for rules-only.
    ///
    /// Provider credentials (API keys, endpoints) are read by genai itself.
    pub fn create_classifier(&self) -> Option<Arc<dyn Classifier>> {
        self.provider.map(|provider| {
            Arc::new(GenAiClassifier::new(
                provider,
                self.model.clone(),
                self.classifier_timeout(),
            )) as Arc<dyn Classifier>
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ToolcastConfig {
        ToolcastConfig {
            namespace: DEFAULT_NAMESPACE.to_string(),
            provider: None,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            classifier_timeout_secs: DEFAULT_CLASSIFIER_TIMEOUT_SECS,
            feed_timeout_secs: DEFAULT_FEED_TIMEOUT_SECS,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_invalid_namespace_rejected() {
        let mut config = base();
        config.namespace = "my tools".to_string();
        assert!(config.validate().is_err());

        config.namespace = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = base();
        config.classifier_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.feed_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.refresh_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = base();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rules_only_without_provider() {
        let config = base();
        assert!(config.create_classifier().is_none());
    }

    #[test]
    fn test_duration_accessors() {
        let config = base();
        assert_eq!(config.classifier_timeout(), Duration::from_secs(15));
        assert_eq!(config.feed_timeout(), Duration::from_secs(10));
        assert_eq!(config.refresh_interval(), Duration::from_secs(3600));
    }
}
