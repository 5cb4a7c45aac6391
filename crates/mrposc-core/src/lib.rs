//! # mrposc core
//!
//! Error handling and configuration shared by the mrposc address filter and its CLI.
//!
//! - **Errors**: `thiserror` enums for the filter outcome taxonomy and for
//!   configuration failures. All of them are serializable.
//! - **Configuration**: YAML files with `MRPOSC__*` environment overrides.

pub mod config;
pub mod error;

pub use config::{AppConfig, FilterSettings, LogFormat, LoggingConfig};
pub use error::{ConfigError, FilterError, MrpOscError, Result, INVALID_PATH_PREFIX};
