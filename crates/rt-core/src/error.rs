//! # AppError
//!
//! Centralized error handling for RocketTalk.
//! Storage failures and missing records are recoverable at the request
//! boundary; form problems are reported field by field.

use thiserror::Error;

/// The primary error type for all rt-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Record not found (e.g., Message)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Infrastructure failure (e.g., directory missing, disk full, id collision)
    #[error("storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn message_not_found(id: &str) -> Self {
        AppError::NotFound("message".to_string(), id.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(..))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// A problem with one submitted form field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing {0} field!")]
    Missing(&'static str),

    #[error("{0} field cannot be blank!")]
    Blank(&'static str),
}

/// A specialized Result type for RocketTalk logic.
pub type Result<T> = std::result::Result<T, AppError>;
