//! Error types for the catalog server
//!
//! Every failure is rendered as the `{ ok: false, message }` envelope so that
//! clients never see a bare status code or a plain-text rejection.

use axum::{
    http::{header::ALLOW, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// Duplicate unique key (idBook, authorId, username, user id)
    #[error("{0}")]
    Conflict(String),

    /// A write references a record that does not exist
    #[error("{0}")]
    Reference(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authentication(String),

    #[error("Method {method} not allowed")]
    MethodNotAllowed {
        method: Method,
        /// Value of the `Allow` header, e.g. `GET, POST`
        allowed: &'static str,
    },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let key = db_err.constraint().unwrap_or("unique key");
                AppError::Conflict(format!("Duplicate value violates {}", key))
            }
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            _ => AppError::Database(err),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) | AppError::Reference(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub ok: bool,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse { ok: false, message });
        let mut response = (status, body).into_response();

        if let AppError::MethodNotAllowed { allowed, .. } = &self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(*allowed));
        }

        response
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
