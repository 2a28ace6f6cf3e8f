//! Common error types for layout controller components.

use thiserror::Error;

/// Common errors that can occur across layout controller components
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// A role tag reported by the call engine is not part of the closed role set
    #[error("Unknown role tag: {0}")]
    UnknownRole(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Tracing subscriber could not be installed
    #[error("Tracing initialization failed: {0}")]
    Tracing(String),
}

/// Result type alias using `CommonError`
pub type Result<T> = std::result::Result<T, CommonError>;
