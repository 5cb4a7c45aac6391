//! Application configuration for mrposc.
//!
//! This module provides the configuration system used by the `mrposc` binary:
//! - Loading from YAML files
//! - Environment variable overrides (`MRPOSC__SECTION__KEY`)
//! - Validation of all settings

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// # Examples
///
/// ```
/// use mrposc_core::config::AppConfig;
///
/// let config = AppConfig::from_yaml("logging:\n  level: debug\n").unwrap();
/// assert_eq!(config.logging.level, "debug");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application-wide settings
    #[serde(default)]
    pub app: ApplicationConfig,

    /// Address filter settings
    #[serde(default)]
    pub filter: FilterSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&contents)
    }

    /// Loads configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Loads configuration using the `config` crate, layering environment
    /// variables (`MRPOSC__FILTER__METRICS=true`) over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or merged.
    pub fn from_config_builder<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix("MRPOSC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the log level is unknown or the table file is missing.
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.filter.validate()?;
        Ok(())
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name, reported at startup
    #[serde(default = "default_app_name")]
    pub name: String,
}

fn default_app_name() -> String {
    "mrposc".to_string()
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
        }
    }
}

/// Address filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Path to an address table YAML file; the built-in MRP table is used when absent
    #[serde(default)]
    pub table: Option<PathBuf>,

    /// Write every rejection diagnostic to stderr in `run`
    #[serde(default = "default_true")]
    pub log_rejections: bool,

    /// Record accept/reject counters through the `metrics` facade
    #[serde(default)]
    pub metrics: bool,

    /// Prometheus scrape endpoint, used when `metrics` is enabled
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: SocketAddr,
}

fn default_true() -> bool {
    true
}

fn default_metrics_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            table: None,
            log_rejections: true,
            metrics: false,
            metrics_addr: default_metrics_addr(),
        }
    }
}

impl FilterSettings {
    fn validate(&self) -> Result<()> {
        if let Some(ref table) = self.table {
            if !table.exists() {
                return Err(ConfigError::file_not_found(table.display().to_string()).into());
            }
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "text" or "json"
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(()),
            _ => Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level '{}'", self.level),
            )
            .into()),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Structured JSON lines
    Json,
}
