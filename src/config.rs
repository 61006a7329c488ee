//! # Configuration
//!
//! Application configuration loading and management.
//!
//! # Configuration Sources
//!
//! Configuration is loaded in the following order (later sources override earlier):
//! 1. Default values
//! 2. Configuration file (if exists)
//! 3. Environment variables (prefixed with `ORACLE_ARBITRATION_`)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ORACLE_ARBITRATION_CONFIG_FILE` | Configuration file | `config.toml` |
//! | `ORACLE_ARBITRATION_LOG_LEVEL` | Log level | `info` |
//! | `ORACLE_ARBITRATION_LOG_FORMAT` | Log format (json/pretty) | `json` |
//! | `ORACLE_ARBITRATION_BRIDGES_PATH` | Bridge registry JSON file | none |
//! | `ORACLE_ARBITRATION_TEMPLATE_ID` | Question template id | `0` |
//! | `ORACLE_ARBITRATION_LANGUAGE` | Question language tag | `en` |
//! | `ORACLE_ARBITRATION_MAX_NONCE` | Exclusive bound of random nonces | `1000000` |
//! | `ORACLE_ARBITRATION_CONFIRMATIONS` | Confirmations to wait for | `1` |
//! | `ORACLE_ARBITRATION_ENVIRONMENT` | Environment name | `development` |
//!
//! # Examples
//!
//! ```ignore
//! use oracle_arbitration::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const ENV_PREFIX: &str = "ORACLE_ARBITRATION_";

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (structured logging).
    #[default]
    Json,
    /// Pretty format (human-readable).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include target (module path) in logs.
    #[serde(default = "default_true")]
    pub include_target: bool,

    /// Include span information in logs.
    #[serde(default = "default_true")]
    pub include_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Json,
            include_target: true,
            include_spans: true,
        }
    }
}

// ============================================================================
// Registry Configuration
// ============================================================================

/// Bridge registry source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// JSON file holding the bridge records. `None` starts with an empty
    /// registry.
    #[serde(default)]
    pub bridges_path: Option<PathBuf>,
}

// ============================================================================
// Pipeline Configuration
// ============================================================================

/// Transaction pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Question template id passed to `askQuestion`.
    #[serde(default)]
    pub template_id: u64,

    /// Language tag appended to question text.
    #[serde(default = "default_language")]
    pub language: String,

    /// Exclusive upper bound of randomly drawn question nonces.
    #[serde(default = "default_max_nonce")]
    pub max_nonce: u64,

    /// Block confirmations to wait for before a receipt counts.
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            template_id: 0,
            language: default_language(),
            max_nonce: default_max_nonce(),
            confirmations: default_confirmations(),
        }
    }
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Bridge registry configuration.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Pipeline configuration.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Environment (development, staging, production).
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            registry: RegistryConfig::default(),
            pipeline: PipelineConfig::default(),
            environment: default_environment(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment and an optional
    /// config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, or an override has an unusable value.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Loads configuration, reading environment variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::load`].
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config_path =
            lookup(&env_name("CONFIG_FILE")).unwrap_or_else(|| "config.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies environment overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let var = |name: &str| lookup(&env_name(name));

        // Logging configuration
        if let Some(level) = var("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.log.format = match format.to_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                _ => LogFormat::Json,
            };
        }

        // Registry configuration
        if let Some(path) = var("BRIDGES_PATH") {
            let path = path.trim();
            self.registry.bridges_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }

        // Pipeline configuration
        if let Some(value) = var("TEMPLATE_ID") {
            self.pipeline.template_id = parse_number("pipeline.template_id", &value)?;
        }
        if let Some(language) = var("LANGUAGE") {
            self.pipeline.language = language;
        }
        if let Some(value) = var("MAX_NONCE") {
            self.pipeline.max_nonce = parse_number("pipeline.max_nonce", &value)?;
        }
        if let Some(value) = var("CONFIRMATIONS") {
            self.pipeline.confirmations = parse_number("pipeline.confirmations", &value)?;
        }

        if let Some(env) = var("ENVIRONMENT") {
            self.environment = env;
        }
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "log.level",
                format!(
                    "invalid log level '{}', must be one of: {:?}",
                    self.log.level, valid_levels
                ),
            ));
        }

        let language = self.pipeline.language.trim();
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ConfigError::invalid(
                "pipeline.language",
                format!("invalid language tag '{}'", self.pipeline.language),
            ));
        }

        if self.pipeline.max_nonce == 0 {
            return Err(ConfigError::invalid("pipeline.max_nonce", "must be greater than zero"));
        }

        Ok(())
    }
}

fn env_name(name: &str) -> String {
    format!("{ENV_PREFIX}{name}")
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(field, format!("'{value}': {e}")))
}

// ============================================================================
// Default Value Functions
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_max_nonce() -> u64 {
    1_000_000
}

fn default_confirmations() -> usize {
    1
}

fn default_environment() -> String {
    "development".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.pipeline.template_id, 0);
        assert_eq!(config.pipeline.language, "en");
        assert_eq!(config.pipeline.max_nonce, 1_000_000);
        assert_eq!(config.pipeline.confirmations, 1);
        assert!(config.registry.bridges_path.is_none());
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn log_format_default() {
        assert_eq!(LogFormat::default(), LogFormat::Json);
    }

    #[test]
    fn app_config_validate_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn app_config_validate_invalid_log_level() {
        let mut config = AppConfig::default();
        config.log.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn app_config_validate_invalid_language() {
        let mut config = AppConfig::default();
        config.pipeline.language = "e n".to_string();
        assert!(config.validate().is_err());
        config.pipeline.language = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn app_config_validate_zero_nonce_bound() {
        let mut config = AppConfig::default();
        config.pipeline.max_nonce = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            environment = "production"

            [registry]
            bridges_path = "data/bridges.json"

            [pipeline]
            confirmations = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.environment, "production");
        assert_eq!(
            config.registry.bridges_path,
            Some(PathBuf::from("data/bridges.json"))
        );
        assert_eq!(config.pipeline.confirmations, 3);
        assert_eq!(config.pipeline.language, "en");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            AppConfig::from_toml_str("pipeline = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides() {
        let config = AppConfig::load_with(lookup(&[
            ("ORACLE_ARBITRATION_CONFIG_FILE", "/nonexistent/config.toml"),
            ("ORACLE_ARBITRATION_LOG_LEVEL", "debug"),
            ("ORACLE_ARBITRATION_LOG_FORMAT", "Pretty"),
            ("ORACLE_ARBITRATION_BRIDGES_PATH", "/srv/bridges.json"),
            ("ORACLE_ARBITRATION_MAX_NONCE", "500"),
            ("ORACLE_ARBITRATION_LANGUAGE", "es"),
        ]))
        .unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(
            config.registry.bridges_path,
            Some(PathBuf::from("/srv/bridges.json"))
        );
        assert_eq!(config.pipeline.max_nonce, 500);
        assert_eq!(config.pipeline.language, "es");
    }

    #[test]
    fn invalid_numeric_override() {
        let err = AppConfig::load_with(lookup(&[
            ("ORACLE_ARBITRATION_CONFIG_FILE", "/nonexistent/config.toml"),
            ("ORACLE_ARBITRATION_CONFIRMATIONS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("pipeline.confirmations"));
    }

    #[test]
    fn loads_config_file() {
        let path = std::env::temp_dir().join(format!(
            "oracle-arbitration-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[pipeline]\ntemplate_id = 2\n").unwrap();

        let config = AppConfig::load_with(lookup(&[(
            "ORACLE_ARBITRATION_CONFIG_FILE",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.pipeline.template_id, 2);
    }
}
