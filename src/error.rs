use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

/// Hides internal error details from clients when set
static PRODUCTION: AtomicBool = AtomicBool::new(false);

/// Switch error responses between detailed and generic 500 messages
pub fn set_production(production: bool) {
    PRODUCTION.store(production, Ordering::Relaxed);
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Unique constraint violations; reported as 400 like other validation errors
    #[error("{0}")]
    Conflict(String),

    /// A child resource does not belong to the parent named in the path
    #[error("{0}")]
    Forbidden(String),

    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    pub fn internal(message: impl Into<String>, detail: impl ToString) -> Self {
        AppError::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client
    pub fn public_message(&self, production: bool) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Forbidden(msg) => msg.clone(),
            AppError::Internal { message, detail } => {
                if production {
                    message.clone()
                } else {
                    detail.clone()
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = ErrorResponse {
            error: self.public_message(PRODUCTION.load(Ordering::Relaxed)),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid form data: {}", err.body_text()))
    }
}

/// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting Option to AppError::NotFound
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(msg.into()))
    }
}

/// Maps database failures onto the error taxonomy
pub trait DbResultExt<T> {
    /// Unique violations become `Conflict(conflict)`, anything else is internal
    fn on_conflict(self, conflict: &str, failure: &str) -> AppResult<T>;
    /// Any failure is internal with `failure` as the production message
    fn or_internal(self, failure: &str) -> AppResult<T>;
}

impl<T> DbResultExt<T> for Result<T, DbErr> {
    fn on_conflict(self, conflict: &str, failure: &str) -> AppResult<T> {
        self.map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Conflict(conflict.to_string())
            } else {
                AppError::internal(failure, err)
            }
        })
    }

    fn or_internal(self, failure: &str) -> AppResult<T> {
        self.map_err(|err| AppError::internal(failure, err))
    }
}

/// Whether the error is a unique constraint violation
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = AppError::NotFound("Guest not found".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Conflict("dup".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Forbidden("nope".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::internal("Failed", "boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_production_hides_detail() {
        let err = AppError::internal("Failed to create guest", "connection reset");
        assert_eq!(err.public_message(true), "Failed to create guest");
        assert_eq!(err.public_message(false), "connection reset");

        let db = Err::<(), _>(DbErr::Custom("disk full".into()))
            .or_internal("Failed to create guest")
            .unwrap_err();
        assert_eq!(db.public_message(true), "Failed to create guest");
        assert!(db.public_message(false).contains("disk full"));

        let bad = AppError::BadRequest("Name is required".into());
        assert_eq!(bad.public_message(true), "Name is required");
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_not_found("Item not found");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_non_unique_db_error_is_internal() {
        let res: Result<(), DbErr> = Err(DbErr::Custom("other".into()));
        let err = res.on_conflict("exists", "Failed").unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }
}
