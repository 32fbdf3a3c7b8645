//! Domain service for authentication.
//!
//! Handles login, API-key verification, and password changes for principals.

use serde::Serialize;
use thiserror::Error;

use crate::db::Principal;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Principal not found")]
    PrincipalNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Login result returned to the session-establishing handler.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub username: String,
    pub full_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub api_key: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials, stamps `last_login`, and returns principal info.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Verifies an API key and returns the associated principal if valid.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<Principal>, AuthError>;

    /// Looks up a principal by username.
    async fn get_principal(&self, username: &str) -> Result<Principal, AuthError>;

    /// Changes a principal's own password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect
    /// or the new password is invalid.
    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
