use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanoaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CanoaError>;

/// Failure classes for a board fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure or timeout.
    Transport,
    /// HTTP 401/403.
    Auth,
    /// HTTP 404.
    NotFound,
    /// HTTP 5xx or a payload that could not be decoded.
    ServerError,
    /// Any other non-2xx status.
    Unexpected,
}

impl ErrorKind {
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::Auth | ErrorKind::NotFound)
    }

    pub fn is_retryable(self) -> bool {
        !self.is_fatal()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "network error"),
            ErrorKind::Auth => write!(f, "authentication failed"),
            ErrorKind::NotFound => write!(f, "board not found"),
            ErrorKind::ServerError => write!(f, "server error"),
            ErrorKind::Unexpected => write!(f, "unexpected response"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
