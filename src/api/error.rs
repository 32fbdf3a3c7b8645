use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use std::fmt;

use super::ApiResponse;
use crate::services::{AdminUserError, AuthError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    /// Deletion refused because other rows still reference the target.
    Integrity(String),

    InternalError(String),

    Unauthorized(String),

    /// Authenticated but lacking the staff flag.
    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Integrity(msg) => write!(f, "Integrity error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) | ApiError::Integrity(msg) => {
                (StatusCode::CONFLICT, msg.clone())
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::PrincipalNotFound => ApiError::Unauthorized("Unknown account".to_string()),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AdminUserError> for ApiError {
    fn from(err: AdminUserError) -> Self {
        match err {
            AdminUserError::Validation(msg) => ApiError::ValidationError(msg),
            AdminUserError::Conflict(msg) => ApiError::Conflict(msg),
            AdminUserError::NotFound => ApiError::NotFound("Admin user not found".to_string()),
            AdminUserError::Database(msg) => ApiError::DatabaseError(msg),
            AdminUserError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    /// Classify a store failure per the error taxonomy: unique violations are
    /// conflicts, restricted foreign keys are integrity refusals, the rest is
    /// an opaque database error.
    pub fn from_store(err: anyhow::Error) -> Self {
        if let Some(db_err) = err.downcast_ref::<DbErr>() {
            match db_err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    return ApiError::Conflict("Record violates a uniqueness rule".to_string());
                }
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    return ApiError::Integrity(
                        "Operation refused: other records still reference this one".to_string(),
                    );
                }
                _ => return ApiError::DatabaseError(db_err.to_string()),
            }
        }
        ApiError::InternalError(err.to_string())
    }
}
