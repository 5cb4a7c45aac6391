//! Error types for the mrposc address filter.
//!
//! Dispatch itself never fails: an unknown address is an expected outcome that is
//! routed to the reject channel. The variants below describe that outcome and the
//! construction-time failures of tables and configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Leading text of every reject-channel diagnostic
pub const INVALID_PATH_PREFIX: &str = "invalid path: ";

/// Result type alias using MrpOscError as the error type.
pub type Result<T> = std::result::Result<T, MrpOscError>;

/// Top-level error type for all mrposc operations.
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum MrpOscError {
    /// Address filter errors
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the address filter and its table.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FilterError {
    /// The address is not present in the address table.
    ///
    /// The rendered message is exactly the diagnostic sent on the reject channel.
    #[error("{}{}", INVALID_PATH_PREFIX, .address)]
    UnrecognizedAddress { address: String },

    /// The same address appears twice while building a table
    #[error("Duplicate address in table: {address}")]
    DuplicateAddress { address: String },

    /// An entry that cannot be an OSC address
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
}

impl FilterError {
    /// Creates an unrecognized address error.
    pub fn unrecognized(address: impl Into<String>) -> Self {
        Self::UnrecognizedAddress {
            address: address.into(),
        }
    }

    /// Creates an invalid address error.
    pub fn invalid(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
