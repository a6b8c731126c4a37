//! Error types for the session cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Session Cache Error Enum ==
/// Unified error type for connections, cursors and the host API.
///
/// Cache traversal never produces an error: a missing path is a miss.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionCacheError {
    /// The remote client refused or failed to open a connection
    #[error("Connection failed: {0}")]
    Connect(String),

    /// A remote query execution failed
    #[error("Execution failed: {0}")]
    Execute(String),

    /// Operation attempted on a connection that is already closed
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// A query was issued before the login gate reached the connected state
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Unknown UI session identifier
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Invalid request data or option value
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for SessionCacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionCacheError::Connect(_) => StatusCode::UNAUTHORIZED,
            SessionCacheError::Execute(_) => StatusCode::BAD_GATEWAY,
            SessionCacheError::ConnectionClosed(_) => StatusCode::CONFLICT,
            SessionCacheError::NotConnected(_) => StatusCode::CONFLICT,
            SessionCacheError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SessionCacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the session cache.
pub type Result<T> = std::result::Result<T, SessionCacheError>;
