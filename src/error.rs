//! Error types and handling for the carbon assessment pipeline

use thiserror::Error;

/// Main error type for `Carbon Shunya`
#[derive(Error, Debug)]
pub enum CarbonError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Errors talking to an external data provider
    #[error("API error ({provider}): {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CarbonError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn api<S: Into<String>>(provider: &'static str, message: S) -> Self {
        Self::Api {
            provider,
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CarbonError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            CarbonError::Api { provider, .. } => {
                format!("Unable to reach the {provider} service. Please check your internet connection.")
            }
            CarbonError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            CarbonError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
