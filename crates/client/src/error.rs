//! Client-side error model.

use lodge_core::DomainError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure talking to the reservation backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response. `message` is the body's `message` field, if any.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Http { status: u16, message: Option<String> },

    /// 2xx response carrying `success: false`.
    #[error("request rejected: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn http(status: u16, message: Option<String>) -> Self {
        Self::Http { status, message }
    }

    pub fn rejected(message: Option<String>) -> Self {
        Self::Rejected { message }
    }

    /// The message the server put in the response body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Http { message, .. } | ApiError::Rejected { message } => {
                message.as_deref().filter(|m| !m.trim().is_empty())
            }
            ApiError::Network(_) | ApiError::Parse(_) => None,
        }
    }

    /// Text suitable for the error banner: the server's message when present,
    /// else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

/// Error returned by engine operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The engine was shut down; no further state updates are accepted.
    #[error("engine has been shut down")]
    Shutdown,
}

impl EngineError {
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            EngineError::Api(e) => Some(e),
            _ => None,
        }
    }
}
