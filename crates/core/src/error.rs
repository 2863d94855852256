//! Error types for Cachewarden.

use thiserror::Error;

/// Result type alias using Cachewarden's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Cachewarden.
///
/// Policy refusals are deliberately not represented here: a hard block is
/// a valid outcome, not a failure, and is carried by the outcome enums in
/// [`crate::types`] so callers can branch on it without error plumbing.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid combination of arguments.
    #[error("Usage error: {0}")]
    Usage(String),

    /// Network failure, timeout, or connection error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response from the remote cache service.
    #[error("Remote cache error (status {status}): {body}")]
    Remote { status: u16, body: String },

    /// Missing or invalid credentials or cache identity.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a remote error from a status code and response body.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a bounded retry may help. Transport failures and 5xx
    /// responses are transient; 4xx and everything else is fatal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
