use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unauthenticated,
    InvalidArgument,
    NotFound,
    Internal,
}

impl ErrorCode {
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::Unauthenticated => 401,
            ErrorCode::InvalidArgument => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Unauthenticated => write!(f, "UNAUTHENTICATED"),
            ErrorCode::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Error surfaced to callers: a code plus a readable message. Internal
/// errors keep the failure that caused them as `source`.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct CallError {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl CallError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CallError {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "The user must be authenticated.")
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Wraps an unexpected failure as `Error: <cause>`.
    pub fn internal<E>(cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        CallError {
            code: ErrorCode::Internal,
            message: format!("Error: {cause}"),
            source: Some(Box::new(cause)),
        }
    }
}

/// Missing configuration is reported with its own message, unprefixed.
impl From<ConfigError> for CallError {
    fn from(err: ConfigError) -> Self {
        CallError {
            code: ErrorCode::Internal,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
