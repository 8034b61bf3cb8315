//! Error types for the Nest client.

use nest_core::ErrorKind;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to a Nest server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server rejected the operation
    #[error("Server error ({status}): {message}")]
    Api {
        status: u16,
        /// Error category reported by the server, when it sent one
        kind: Option<ErrorKind>,
        message: String,
    },

    /// Authentication required but no token available, or the token was refused
    #[error("Authentication required")]
    AuthRequired,

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl ClientError {
    /// Server-reported category, if any
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api { kind, .. } => *kind,
            _ => None,
        }
    }

    /// True when a refresh (not a retry) is the right reaction
    pub fn needs_refresh(&self) -> bool {
        matches!(
            self.kind(),
            Some(ErrorKind::NotFound | ErrorKind::Conflict)
        )
    }
}

/// JSON error body sent by the server
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub kind: Option<ErrorKind>,
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
