//! Server-level error type
//!
//! Feature routes map their own command and query errors; this type covers
//! the handlers that live outside a feature slice.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::db::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::Store(ref e) => {
                tracing::error!("Database error: {:?}", e);
                ErrorResponse::new("DATABASE_UNAVAILABLE", "The database is not reachable")
            },
            AppError::NotFound(message) => ErrorResponse::new("NOT_FOUND", message),
            AppError::Validation(message) => ErrorResponse::new("VALIDATION_ERROR", message),
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
            },
        };

        error.into_response_with(status)
    }
}
