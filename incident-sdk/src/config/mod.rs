//! Configuration management for the incident SDK
//!
//! This module provides utilities for loading and validating client
//! configuration, with support for environment variables.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::resilience::{BackoffPolicy, RetryConfig};

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.parse::<i64>().map_err(|e| {
            ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e))
        })
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer configuration value with a default
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        env_key.push_str(
            &key.to_uppercase()
                .replace(|c: char| !c.is_ascii_alphanumeric(), "_"),
        );

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    /// Configuration values
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Global default configuration provider
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("INCIDENT")));

/// Trait for service-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

/// Configuration for the incident response API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentApiConfig {
    /// Base URL of the service
    pub base_url: String,

    /// Hard deadline for a single attempt, in seconds
    pub timeout_seconds: u64,

    /// Total attempt budget, including the initial attempt
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    pub initial_backoff_ms: u64,

    /// Ceiling for backoff delays and Retry-After hints, in milliseconds
    pub max_backoff_ms: u64,

    /// Wall-clock budget for one operation, waits included, in seconds
    pub total_budget_seconds: u64,
}

impl Default for IncidentApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 20,
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 10_000,
            total_budget_seconds: 30,
        }
    }
}

impl IncidentApiConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ConfigProviderExt>(provider: &P) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            base_url: provider.get_string_or("api_base_url", &defaults.base_url),
            timeout_seconds: provider
                .get_int_or("api_timeout_seconds", defaults.timeout_seconds as i64)
                as u64,
            max_attempts: provider.get_int_or("api_max_attempts", defaults.max_attempts as i64)
                as u32,
            initial_backoff_ms: provider
                .get_int_or("api_initial_backoff_ms", defaults.initial_backoff_ms as i64)
                as u64,
            max_backoff_ms: provider
                .get_int_or("api_max_backoff_ms", defaults.max_backoff_ms as i64)
                as u64,
            total_budget_seconds: provider.get_int_or(
                "api_total_budget_seconds",
                defaults.total_budget_seconds as i64,
            ) as u64,
        };

        config.validate()?;
        Ok(config)
    }

    /// Retry configuration derived from this client configuration
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            attempt_timeout: Duration::from_secs(self.timeout_seconds),
            total_budget: Duration::from_secs(self.total_budget_seconds),
            backoff: BackoffPolicy {
                initial_delay: Duration::from_millis(self.initial_backoff_ms),
                max_delay: Duration::from_millis(self.max_backoff_ms),
            },
        }
    }
}

impl ServiceConfig for IncidentApiConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ServiceError::configuration("Base URL is required"));
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(ServiceError::configuration(format!(
                "Base URL is not a valid URL: {}",
                self.base_url
            )));
        }

        if self.max_attempts == 0 {
            return Err(ServiceError::configuration(
                "At least one attempt is required",
            ));
        }

        if self.timeout_seconds == 0 || self.total_budget_seconds == 0 {
            return Err(ServiceError::configuration(
                "Timeouts must be greater than zero",
            ));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "incident-api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("key1", "value1");
        provider.set("key2", "123");

        assert_eq!(provider.get_string("key1").unwrap(), "value1");
        assert_eq!(provider.get_int("key2").unwrap(), 123);
        assert!(provider.get_string("key3").is_err());
    }

    #[test]
    fn test_env_config_provider_key_format() {
        let provider = EnvConfigProvider::new().with_prefix("INCIDENT");

        assert_eq!(provider.format_key("api_base_url"), "INCIDENT_API_BASE_URL");
        assert_eq!(provider.format_key("base-url"), "INCIDENT_BASE_URL");
    }

    #[test]
    fn test_config_from_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("api_base_url", "http://incident.internal:8000");
        provider.set("api_max_attempts", "5");

        let config = IncidentApiConfig::from_provider(&provider).unwrap();
        assert_eq!(config.base_url, "http://incident.internal:8000");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.timeout_seconds, 20); // Default value
    }

    #[test]
    fn test_config_validation() {
        let config = IncidentApiConfig {
            base_url: "".to_string(),
            ..IncidentApiConfig::default()
        };
        assert!(config.validate().is_err());

        let config = IncidentApiConfig {
            base_url: "not a url".to_string(),
            ..IncidentApiConfig::default()
        };
        assert!(config.validate().is_err());

        let config = IncidentApiConfig {
            max_attempts: 0,
            ..IncidentApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_derivation() {
        let config = IncidentApiConfig::default();
        let retry = config.retry_config();

        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.attempt_timeout, Duration::from_secs(20));
        assert_eq!(retry.total_budget, Duration::from_secs(30));
        assert_eq!(retry.backoff.initial_delay, Duration::from_secs(1));
        assert_eq!(retry.backoff.max_delay, Duration::from_secs(10));
    }
}
