//! Domain service for provisioning administrative users.
//!
//! An administrative user is a linked pair: a principal (the authentication
//! identity) and an admin profile (the business record). The pair is created
//! and destroyed together; this service is the only public path to either
//! half.

use serde::Serialize;
use thiserror::Error;

use crate::db::VisibilityScope;

/// Minimum accepted password length for provisioning and password changes.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Errors specific to admin-user provisioning.
#[derive(Debug, Error)]
pub enum AdminUserError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Admin user not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AdminUserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

/// Full outward representation of an admin user. The password hash never
/// appears here; `full_name`, `is_active`, and `created_by_name` are derived
/// on read and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub status: String,
    pub notes: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub full_name: String,
    pub is_active: bool,
    pub created_by_name: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CreateAdminUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub status: String,
    pub notes: String,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Default)]
pub struct UpdateAdminUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

/// Visibility policy: superusers see all profiles, everyone else sees only
/// the profiles they provisioned.
#[must_use]
pub const fn visibility_for(principal_id: i32, is_superuser: bool) -> VisibilityScope {
    if is_superuser {
        VisibilityScope::All
    } else {
        VisibilityScope::CreatedBy(principal_id)
    }
}

/// Domain service trait for admin-user provisioning.
#[async_trait::async_trait]
pub trait AdminUserService: Send + Sync {
    /// Lists admin users visible within the scope, in creation order.
    async fn list(&self, scope: VisibilityScope) -> Result<Vec<AdminUser>, AdminUserError>;

    /// Fetches one admin user; ids outside the scope read as absent.
    async fn get(&self, id: i32, scope: VisibilityScope) -> Result<AdminUser, AdminUserError>;

    /// Creates the principal + profile pair atomically with `created_by`
    /// set to the requesting principal.
    ///
    /// # Errors
    ///
    /// Returns [`AdminUserError::Validation`] for a short password and
    /// [`AdminUserError::Conflict`] for a duplicate username; in both cases
    /// neither record persists.
    async fn create(
        &self,
        input: CreateAdminUser,
        requesting_principal: i32,
    ) -> Result<AdminUser, AdminUserError>;

    /// Applies a partial update to both halves of the pair atomically.
    /// A supplied password is re-hashed; omitted fields are untouched.
    async fn update(
        &self,
        id: i32,
        input: UpdateAdminUser,
        scope: VisibilityScope,
    ) -> Result<AdminUser, AdminUserError>;

    /// Deletes the profile and its principal; no authentication identity
    /// survives the business record.
    async fn delete(&self, id: i32, scope: VisibilityScope) -> Result<(), AdminUserError>;
}
