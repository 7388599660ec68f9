//! Error types for the canary hook and its collaborators

use thiserror::Error;

/// Result type alias for canary operations
pub type Result<T> = std::result::Result<T, HookError>;

#[derive(Debug, Error)]
pub enum HookError {
    /// The candidate could not be invoked
    #[error("candidate invocation failed: {0}")]
    Invocation(String),

    /// A consistency store operation failed
    #[error("store {operation} failed: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    #[error("record '{0}' not found after settle interval")]
    RecordNotFound(String),

    /// The verdict could not be delivered; the controller never hears back
    #[error("failed to report verdict: {0}")]
    Reporting(String),

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HookError {
    pub fn store(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Store {
            operation,
            message: message.into(),
        }
    }

    pub fn is_reporting(&self) -> bool {
        matches!(self, HookError::Reporting(_))
    }
}
