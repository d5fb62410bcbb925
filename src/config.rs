//! Startup configuration from the environment

use crate::llm::{ProviderConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::turn::DEFAULT_TOKEN_BUDGET;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TURN_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_THREAD_ID: &str = "health-chat-thread-1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set; add it to the environment or a .env file")]
    MissingVar(&'static str),
    #[error("{var} has an invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub port: u16,
    pub token_budget: usize,
    /// `None` disables the overall turn deadline
    pub turn_timeout: Option<Duration>,
    pub thread_id: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingVar(API_KEY_VAR))?;

        let text = |var: &str, default: &str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let timeout_secs = parsed(
            &lookup,
            "WELLNESS_TURN_TIMEOUT_SECS",
            DEFAULT_TURN_TIMEOUT_SECS,
        )?;

        Ok(Self {
            provider: ProviderConfig {
                api_key,
                base_url: text("WELLNESS_LLM_BASE_URL", DEFAULT_BASE_URL),
                model: text("WELLNESS_MODEL", DEFAULT_MODEL),
            },
            port: parsed(&lookup, "WELLNESS_PORT", DEFAULT_PORT)?,
            token_budget: parsed(&lookup, "WELLNESS_TOKEN_BUDGET", DEFAULT_TOKEN_BUDGET)?,
            turn_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            thread_id: text("WELLNESS_THREAD_ID", DEFAULT_THREAD_ID),
        })
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_with_only_key() {
        let config = config_from(&[(API_KEY_VAR, "sk-test")]).unwrap();
        assert_eq!(config.provider.api_key, "sk-test");
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider.model, DEFAULT_MODEL);
        assert_eq!(config.port, 8000);
        assert_eq!(config.token_budget, 200);
        assert_eq!(config.turn_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.thread_id, "health-chat-thread-1");
    }

    #[test]
    fn test_missing_key_is_fatal() {
        assert_eq!(
            config_from(&[]).unwrap_err(),
            ConfigError::MissingVar(API_KEY_VAR)
        );
        assert_eq!(
            config_from(&[(API_KEY_VAR, "  ")]).unwrap_err(),
            ConfigError::MissingVar(API_KEY_VAR)
        );
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (API_KEY_VAR, "sk-test"),
            ("WELLNESS_LLM_BASE_URL", "http://localhost:9999/v1"),
            ("WELLNESS_MODEL", "local/model"),
            ("WELLNESS_PORT", "3000"),
            ("WELLNESS_TOKEN_BUDGET", " 512 "),
            ("WELLNESS_TURN_TIMEOUT_SECS", "0"),
            ("WELLNESS_THREAD_ID", "other"),
        ])
        .unwrap();
        assert_eq!(config.provider.base_url, "http://localhost:9999/v1");
        assert_eq!(config.provider.model, "local/model");
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_budget, 512);
        assert_eq!(config.turn_timeout, None);
        assert_eq!(config.thread_id, "other");
    }

    #[test]
    fn test_invalid_number() {
        let err = config_from(&[(API_KEY_VAR, "sk-test"), ("WELLNESS_PORT", "eighty")])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "WELLNESS_PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let config = config_from(&[(API_KEY_VAR, "sk-very-secret")]).unwrap();
        assert!(!format!("{config:?}").contains("sk-very-secret"));
    }
}
