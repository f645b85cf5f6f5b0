//! Layered error definitions
//!
//! Categorized by when they occur: before a run (validation / configuration),
//! during an attempt (transport) and beside a run (logging).

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised before a run exists
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Input Errors =====
    /// Malformed user input (recipient, attempt count)
    #[error("validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    // ===== Configuration Errors =====
    /// Empty sender pool or inconsistent policy settings
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// True for malformed-input rejections
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// True for rejections caused by settings rather than input
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::ConfigParse { .. })
    }
}

/// A single send attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The service answered and refused the message
    #[error("{reason}")]
    Rejected { reason: String },

    /// The service could not be reached or answered garbage
    #[error("network error: {message}")]
    Network { message: String },
}

impl TransportError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

/// The run log could not be written
#[derive(Debug, Error)]
#[error("failed to append to run log '{}': {source}", path.display())]
pub struct LoggingError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl LoggingError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
