//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::pagination::CursorError;
use crate::query::FilterError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    #[error("Missing authenticated principal")]
    MissingPrincipal,

    #[error("Permission denied")]
    Forbidden(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Invalid cursor")]
    InvalidCursor,

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<FilterError> for AppError {
    fn from(err: FilterError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<CursorError> for AppError {
    fn from(err: CursorError) -> Self {
        tracing::debug!("Rejected cursor: {}", err);
        AppError::InvalidCursor
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidPrincipal(_) => StatusCode::BAD_REQUEST,
            AppError::MissingPrincipal => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::AccountNotFound(_)
            | AppError::TransactionNotFound(_)
            | AppError::InvalidCursor => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_code, details) = match &self {
            // 400 Bad Request
            AppError::Validation(msg) => ("validation_error", Some(msg.clone())),
            AppError::InvalidPrincipal(msg) => ("invalid_principal", Some(msg.clone())),

            // 401 Unauthorized
            AppError::MissingPrincipal => ("missing_principal", None),

            // 403 Forbidden
            AppError::Forbidden(msg) => ("permission_denied", Some(msg.clone())),

            // 404 Not Found
            AppError::AccountNotFound(id) => ("account_not_found", Some(id.clone())),
            AppError::TransactionNotFound(id) => ("transaction_not_found", Some(id.clone())),
            AppError::InvalidCursor => ("invalid_cursor", None),

            // 500 Internal Server Error
            AppError::Store(e) => {
                tracing::error!("Database error: {:?}", e);
                ("database_error", None)
            }
        };

        // Server-side failures never echo their source message to the client.
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
