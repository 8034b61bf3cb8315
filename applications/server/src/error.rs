/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nest_core::{ErrorKind, NestError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Domain(#[from] NestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl From<nest_storage::StorageError> for ServerError {
    fn from(err: nest_storage::StorageError) -> Self {
        ServerError::Domain(err.into())
    }
}

impl ServerError {
    /// Category sent to the caller alongside the message
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServerError::Domain(e) => e.kind(),
            ServerError::BadRequest(_) | ServerError::Auth(_) | ServerError::Jwt(_) => {
                ErrorKind::InvalidInput
            }
            ServerError::Config(_) | ServerError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, error_message) = match self {
            ServerError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            ServerError::Jwt(ref e) => {
                tracing::warn!("JWT error: {:?}", e);
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            }
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Domain(ref e) if kind == ErrorKind::Internal => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            ServerError::Domain(e) => {
                let status = StatusCode::from_u16(kind.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, e.to_string())
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            ServerError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind.as_str(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nest_core::NodeId;

    #[test]
    fn test_cycle_is_bad_request() {
        let err = ServerError::from(NestError::CyclicReparent {
            node: NodeId::new("a"),
            parent: NodeId::new("b"),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err = ServerError::from(NestError::Storage("disk I/O error at page 7".to_string()));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_status() {
        let err = ServerError::from(NestError::Conflict("raced".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
