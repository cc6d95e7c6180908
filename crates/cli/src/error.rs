//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A command-line override conflicts with the configuration
    #[error("Invalid override: {message}")]
    InvalidOverride { message: String },

    /// Bridge execution error
    #[error("Bridge execution failed: {message}")]
    BridgeExecution { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_override(message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            message: message.into(),
        }
    }

    pub fn bridge_execution(message: impl Into<String>) -> Self {
        Self::BridgeExecution {
            message: message.into(),
        }
    }
}
