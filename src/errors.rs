//! Centralized error handling.
//!
//! Provides a unified error type for the entire application,
//! with automatic HTTP response conversion. Every error belongs to a
//! category and carries a stable code; server-side failures also get a
//! reference id that is logged and returned to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::SqlErr;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Error categories reported to clients and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Database,
    Permission,
    Validation,
    Business,
    System,
    Network,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Database => "database",
            ErrorCategory::Permission => "permission",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Business => "business",
            ErrorCategory::System => "system",
            ErrorCategory::Network => "network",
        }
    }

    /// Server-side categories get a reference id
    pub fn is_server_side(&self) -> bool {
        matches!(
            self,
            ErrorCategory::Database | ErrorCategory::System | ErrorCategory::Network
        )
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account has not been activated")]
    AccountInactive,

    #[error("Access denied")]
    Forbidden,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No active company membership")]
    NoCompany,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("File exceeds the maximum size of {0} MB")]
    FileTooLarge(usize),

    #[error("File type .{0} is not allowed")]
    InvalidFileType(String),

    // Business rules
    #[error("{0}")]
    Business(String),

    #[error("Cannot {action} a request in status {status}")]
    InvalidTransition { action: String, status: String },

    #[error("Registration request has expired")]
    RequestExpired,

    // External service errors
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Cache unavailable")]
    Cache(String),

    #[error("Email delivery failed")]
    Email(String),

    #[error("Storage error")]
    Storage(#[from] std::io::Error),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    category: ErrorCategory,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
}

impl AppError {
    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Unauthorized
            | AppError::InvalidCredentials
            | AppError::AccountInactive
            | AppError::Forbidden
            | AppError::PermissionDenied(_)
            | AppError::NoCompany
            | AppError::Jwt(_) => ErrorCategory::Permission,
            AppError::NotFound
            | AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::FileTooLarge(_)
            | AppError::InvalidFileType(_) => ErrorCategory::Validation,
            AppError::Conflict(_)
            | AppError::Business(_)
            | AppError::InvalidTransition { .. }
            | AppError::RequestExpired => ErrorCategory::Business,
            AppError::Database(_) => ErrorCategory::Database,
            AppError::Cache(_) | AppError::Email(_) => ErrorCategory::Network,
            AppError::Storage(_) | AppError::Internal(_) => ErrorCategory::System,
        }
    }

    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "AUTH001",
            AppError::InvalidCredentials => "AUTH002",
            AppError::AccountInactive => "AUTH003",
            AppError::Jwt(_) => "AUTH004",
            AppError::Forbidden => "PERM001",
            AppError::PermissionDenied(_) => "PERM002",
            AppError::NoCompany => "PERM003",
            AppError::Validation(_) => "VAL001",
            AppError::NotFound => "VAL002",
            AppError::BadRequest(_) => "VAL003",
            AppError::FileTooLarge(_) => "FILE003",
            AppError::InvalidFileType(_) => "FILE004",
            AppError::Business(_) => "BIZ001",
            AppError::Conflict(_) => "BIZ002",
            AppError::InvalidTransition { .. } => "BIZ003",
            AppError::RequestExpired => "BIZ004",
            AppError::Database(e) if is_integrity_error(e) => "DB003",
            AppError::Database(sea_orm::DbErr::Conn(_)) => "DB001",
            AppError::Database(_) => "DB002",
            AppError::Cache(_) => "NET001",
            AppError::Email(_) => "NET002",
            AppError::Storage(_) => "SYS002",
            AppError::Internal(_) => "SYS001",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials | AppError::Jwt(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::AccountInactive
            | AppError::Forbidden
            | AppError::PermissionDenied(_)
            | AppError::NoCompany => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::InvalidFileType(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Business(_) | AppError::RequestExpired => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(e) if is_integrity_error(e) => StatusCode::CONFLICT,
            AppError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Email(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::BadRequest(msg) | AppError::Business(msg) => {
                msg.clone()
            }
            AppError::PermissionDenied(what) => format!("You do not have permission to {}", what),
            AppError::Database(e) if is_integrity_error(e) => {
                "The record conflicts with existing data".to_string()
            }
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Jwt(_) => "Invalid or expired token".to_string(),
            AppError::Cache(_) | AppError::Email(_) => {
                "A dependent service is temporarily unavailable".to_string()
            }
            AppError::Storage(_) => "A file storage error occurred".to_string(),
            AppError::Internal(_) => "An internal error occurred".to_string(),
            _ => self.to_string(),
        }
    }

    /// Internal detail for logs only
    fn detail(&self) -> String {
        match self {
            AppError::Database(e) => format!("{:?}", e),
            AppError::Jwt(e) => format!("{:?}", e),
            AppError::Storage(e) => e.to_string(),
            AppError::Cache(msg) | AppError::Email(msg) | AppError::Internal(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

fn is_integrity_error(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_)) | Some(SqlErr::ForeignKeyConstraintViolation(_))
    )
}

/// Generate a client-visible reference id such as `500-1a2b3c4d`
pub fn error_reference(status: StatusCode) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", status.as_u16(), &id[..8])
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let category = self.category();
        let code = self.code();

        let reference = if category.is_server_side() && !status.is_client_error() {
            let reference = error_reference(status);
            tracing::error!(
                reference = %reference,
                category = %category,
                code = code,
                detail = %self.detail(),
                "Request failed"
            );
            Some(reference)
        } else {
            tracing::warn!(category = %category, code = code, "{}", self);
            None
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                category,
                message: self.user_message(),
                reference,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn business(msg: impl Into<String>) -> Self {
        AppError::Business(msg.into())
    }

    pub fn permission(what: impl Into<String>) -> Self {
        AppError::PermissionDenied(what.into())
    }

    pub fn transition(action: impl Into<String>, status: impl std::fmt::Display) -> Self {
        AppError::InvalidTransition {
            action: action.into(),
            status: status.to_string(),
        }
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        AppError::Cache(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_carry_category_prefix() {
        assert_eq!(AppError::Unauthorized.code(), "AUTH001");
        assert_eq!(AppError::Forbidden.code(), "PERM001");
        assert_eq!(AppError::validation("bad").code(), "VAL001");
        assert_eq!(AppError::business("no").code(), "BIZ001");
        assert_eq!(AppError::internal("boom").code(), "SYS001");
        assert_eq!(AppError::cache("down").code(), "NET001");
        assert_eq!(
            AppError::Database(sea_orm::DbErr::Custom("x".into())).code(),
            "DB002"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(AppError::AccountInactive.category(), ErrorCategory::Permission);
        assert_eq!(AppError::NotFound.category(), ErrorCategory::Validation);
        assert_eq!(AppError::RequestExpired.category(), ErrorCategory::Business);
        assert_eq!(AppError::internal("x").category(), ErrorCategory::System);
        assert!(ErrorCategory::Database.is_server_side());
        assert!(!ErrorCategory::Business.is_server_side());
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::internal("connection string leaked");
        assert_eq!(err.user_message(), "An internal error occurred");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_transition_message() {
        let err = AppError::transition("approve", "rejected");
        assert_eq!(err.to_string(), "Cannot approve a request in status rejected");
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_error_reference_format() {
        let reference = error_reference(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(reference.starts_with("500-"));
        assert_eq!(reference.len(), 12);
    }

    #[test]
    fn test_server_error_response_has_reference() {
        let response = AppError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
