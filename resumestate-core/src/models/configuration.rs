//! Configuration data structures

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable holding the ARN of the failed execution
pub const EXECUTION_ARN_VAR: &str = "EXECUTION_ARN";
/// Environment variable holding the deployment tag used to namespace log lines
pub const ENVIRONMENT_TAG_VAR: &str = "ENVIRONMENT_TAG";
/// Environment variable holding the log verbosity
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Errors raised while reading settings from the environment
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("EXECUTION_ARN is not set and no --execution-arn was given")]
    MissingExecutionArn,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

/// Logging level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogLevel {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "trace")]
    Trace,
}

impl FromStr for LogLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigurationError::InvalidLogLevel(s.to_string())),
        }
    }
}

/// Settings for one recovery run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// ARN of the execution to recover, when one was provided
    pub execution_arn: Option<String>,
    /// Deployment tag attached to every log line
    pub environment_tag: String,
    /// Logging verbosity level
    pub log_level: LogLevel,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// `EXECUTION_ARN` takes precedence over `arn_flag` when both are present.
    pub fn from_env(arn_flag: Option<String>) -> Result<Self, ConfigurationError> {
        Self::from_lookup(arn_flag, |key| env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an injectable variable lookup, so tests
    /// don't race on the real process environment.
    pub fn from_lookup<F>(arn_flag: Option<String>, lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let execution_arn = lookup(EXECUTION_ARN_VAR)
            .filter(|value| !value.trim().is_empty())
            .or(arn_flag)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let environment_tag = lookup(ENVIRONMENT_TAG_VAR).unwrap_or_default();

        let log_level = match lookup(LOG_LEVEL_VAR) {
            Some(level) => level.parse()?,
            None => LogLevel::default(),
        };

        Ok(Self {
            execution_arn,
            environment_tag,
            log_level,
        })
    }

    /// The execution ARN, required by the resume command
    pub fn require_execution_arn(&self) -> Result<&str, ConfigurationError> {
        self.execution_arn
            .as_deref()
            .ok_or(ConfigurationError::MissingExecutionArn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_takes_precedence_over_flag() {
        let settings = Settings::from_lookup(
            Some("arn:flag".to_string()),
            lookup_from(&[(EXECUTION_ARN_VAR, "arn:env"), (ENVIRONMENT_TAG_VAR, "prod")]),
        )
        .unwrap();

        assert_eq!(settings.require_execution_arn().unwrap(), "arn:env");
        assert_eq!(settings.environment_tag, "prod");
        assert_eq!(settings.log_level, LogLevel::Info);
    }

    #[test]
    fn test_flag_used_when_env_missing() {
        let settings =
            Settings::from_lookup(Some("arn:flag".to_string()), lookup_from(&[])).unwrap();
        assert_eq!(settings.execution_arn.as_deref(), Some("arn:flag"));
        assert_eq!(settings.environment_tag, "");
    }

    #[test]
    fn test_missing_execution_arn() {
        let settings =
            Settings::from_lookup(None, lookup_from(&[(EXECUTION_ARN_VAR, "  ")])).unwrap();
        assert!(settings.execution_arn.is_none());
        assert!(matches!(
            settings.require_execution_arn(),
            Err(ConfigurationError::MissingExecutionArn)
        ));
    }

    #[test]
    fn test_log_level_parsing() {
        let settings = Settings::from_lookup(
            None,
            lookup_from(&[(EXECUTION_ARN_VAR, "arn:env"), (LOG_LEVEL_VAR, "DEBUG")]),
        )
        .unwrap();
        assert_eq!(settings.log_level, LogLevel::Debug);

        assert!(matches!(
            "loud".parse::<LogLevel>(),
            Err(ConfigurationError::InvalidLogLevel(_))
        ));
    }
}
