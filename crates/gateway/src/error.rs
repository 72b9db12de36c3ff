//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use frontdesk_tickets::InboxError;
use serde_json::json;
use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let error_response = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<InboxError> for GatewayError {
    fn from(error: InboxError) -> Self {
        let message = error.to_string();
        match error {
            InboxError::NotFound { .. } => GatewayError::NotFound(message),
            InboxError::Unauthorized { .. } => GatewayError::AuthorizationFailed(message),
            InboxError::InvalidState { .. } => GatewayError::InvalidRequest(message),
            InboxError::TransactionAborted { .. } => GatewayError::Conflict(message),
            InboxError::NoEligibleAssignee { .. } => GatewayError::Unprocessable(message),
        }
    }
}

impl From<frontdesk_database::DatabaseError> for GatewayError {
    fn from(error: frontdesk_database::DatabaseError) -> Self {
        GatewayError::DatabaseError(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for GatewayError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        GatewayError::AuthenticationFailed(format!("Invalid token: {}", error))
    }
}
