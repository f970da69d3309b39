//! Errors raised by LLM clients.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    TimeoutError { seconds: u64 },

    ConfigurationError { message: String },

    Other { message: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "LLM request timed out after {} seconds", seconds)
            }
            BackendError::ConfigurationError { message } => {
                write!(f, "LLM configuration error: {}", message)
            }
            BackendError::Other { message } => write!(f, "LLM error: {}", message),
        }
    }
}

impl std::error::Error for BackendError {}
