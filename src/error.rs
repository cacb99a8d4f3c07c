//! Error types for the web app sample.
//!
//! Errors fall into three families: configuration problems, failures reported
//! by the Azure management API, and cleanup failures. Cleanup failures never
//! surface as errors; they are logged and recorded in
//! [`CleanupOutcome`](crate::cleanup::CleanupOutcome) instead.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the sample.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Azure management API errors.
    #[error("Azure error: {0}")]
    Azure(#[from] AzureError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was interrupted before it finished.
    #[error("Run cancelled")]
    Cancelled,

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file was not found.
    #[error("Settings file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The settings file could not be parsed.
    #[error("Failed to parse settings: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Settings validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// Azure management API errors.
#[derive(Debug, Error)]
pub enum AzureError {
    /// Authentication failed, either locally (missing credentials) or at the
    /// token endpoint.
    #[error("Azure authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// API request failed.
    #[error("Azure API request failed: {status} {code} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// ARM error code, or `Unknown`.
        code: String,
        /// Error message from the API.
        message: String,
    },

    /// Resource not found.
    #[error("Resource not found: {resource}")]
    ResourceNotFound {
        /// Path or name of the missing resource.
        resource: String,
    },

    /// A long-running operation finished in a failed state.
    #[error("Operation {operation} finished with status {status}")]
    OperationFailed {
        /// Description of the operation.
        operation: String,
        /// Terminal status reported by the service.
        status: String,
    },

    /// Network error.
    #[error("Network error communicating with Azure: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid response from Azure: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// Timed out waiting for a long-running operation.
    #[error("Timeout waiting for {operation} to complete")]
    Timeout {
        /// Description of the operation.
        operation: String,
    },
}

/// Result type alias for sample operations.
pub type Result<T> = std::result::Result<T, SampleError>;

impl SampleError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error came from authentication.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Azure(AzureError::AuthenticationFailed { .. }))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl AzureError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
