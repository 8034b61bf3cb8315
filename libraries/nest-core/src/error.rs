/// Core error types for the playlist tree
use crate::types::{MembershipId, NodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `NestError`
pub type Result<T> = std::result::Result<T, NestError>;

/// Core error type
#[derive(Error, Debug)]
pub enum NestError {
    /// Entity missing, or owned by someone else (deliberately indistinguishable)
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Caller's belief about a track's container no longer matches the store
    #[error("Track {track} is not in playlist {claimed_source}; refresh and try again")]
    StaleSource {
        track: MembershipId,
        claimed_source: NodeId,
    },

    /// Reparent would make a node its own ancestor
    #[error("Cannot move a playlist into its own sub-playlist ({node} under {parent})")]
    CyclicReparent { node: NodeId, parent: NodeId },

    /// Reorder list does not match the container's current membership
    #[error("Reorder rejected: {0}")]
    ReorderMismatch(String),

    /// Any other mutation that would violate a tree invariant
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Malformed input (names, ids)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A concurrent mutation invalidated this operation's preconditions
    #[error("Conflict: {0}")]
    Conflict(String),

    /// External catalog failed
    #[error("Catalog unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Coarse error category shared by every surface (HTTP, client, UI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidOperation,
    InvalidInput,
    Conflict,
    UpstreamUnavailable,
    Internal,
}

impl ErrorKind {
    /// HTTP-equivalent status code
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidOperation | ErrorKind::InvalidInput => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::UpstreamUnavailable => 503,
            ErrorKind::Internal => 500,
        }
    }

    /// Stable wire name
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidOperation => "invalid_operation",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Conflict => "conflict",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl NestError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Not found error for a playlist node
    pub fn node_not_found(id: &NodeId) -> Self {
        Self::not_found("Playlist", id.as_str())
    }

    /// Not found error for a track membership
    pub fn track_not_found(id: &MembershipId) -> Self {
        Self::not_found("Track", id.as_str())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            NestError::NotFound { .. } | NestError::StaleSource { .. } => ErrorKind::NotFound,
            NestError::CyclicReparent { .. }
            | NestError::ReorderMismatch(_)
            | NestError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            NestError::InvalidInput(_) => ErrorKind::InvalidInput,
            NestError::Conflict(_) => ErrorKind::Conflict,
            NestError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            NestError::Storage(_) | NestError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for NestError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
