//! Response Types
//!
//! Standard response envelope for all commands.

use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Generic command response for all commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response with message
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T> From<Result<T, AppError>> for CommandResponse<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(user_message(&e)),
        }
    }
}

/// Message shown to the user for an error.
///
/// Validation messages are already user-facing and pass through without the
/// category prefix.
pub fn user_message(err: &AppError) -> String {
    match err {
        AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
        other => other.to_string(),
    }
}
