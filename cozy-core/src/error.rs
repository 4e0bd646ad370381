//! Error types for the cozy client.

use thiserror::Error;

/// Errors that can occur while talking to the cozy services.
#[derive(Error, Debug)]
pub enum CozyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Not logged in. Run `cozy login` first.")]
    NotAuthenticated,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CozyError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CozyError::Validation {
            field,
            message: message.into(),
        }
    }

    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CozyError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transport failures and server-side (5xx) errors are worth retrying for reads.
    /// Client errors and validation failures never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            CozyError::Transport(_) => true,
            CozyError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<reqwest::Error> for CozyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CozyError::Serialization(err.to_string())
        } else {
            CozyError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CozyError {
    fn from(err: serde_json::Error) -> Self {
        CozyError::Serialization(err.to_string())
    }
}

/// Result type alias for cozy operations.
pub type CozyResult<T> = Result<T, CozyError>;
