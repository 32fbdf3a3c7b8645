use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{CurrentUser, require_staff};
use super::validation::{
    ADMIN_ROLES, ADMIN_STATUSES, validate_choice, validate_email, validate_id, validate_username,
};
use super::{ApiError, ApiResponse, AppState};
use crate::services::{AdminUser, CreateAdminUser, UpdateAdminUser, visibility_for};

const fn default_role() -> &'static str {
    "admin"
}

const fn default_status() -> &'static str {
    "active"
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Write-only; never echoed back in any representation.
    pub password: String,
    pub role: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_true")]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateAdminUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Write-only; re-hashed when present, untouched when absent or empty.
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

pub async fn list_admin_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<AdminUser>>>, ApiError> {
    let scope = visibility_for(user.id, user.is_superuser);
    let users = state.admin_user_service().list(scope).await?;

    Ok(Json(ApiResponse::success(users)))
}

pub async fn get_admin_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AdminUser>>, ApiError> {
    let id = validate_id(id)?;
    let scope = visibility_for(user.id, user.is_superuser);
    let admin_user = state.admin_user_service().get(id, scope).await?;

    Ok(Json(ApiResponse::success(admin_user)))
}

pub async fn create_admin_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateAdminUserRequest>,
) -> Result<Json<ApiResponse<AdminUser>>, ApiError> {
    require_staff(&user)?;

    let username = validate_username(&payload.username)?.to_string();
    let email = validate_email(&payload.email)?.to_string();
    let role = payload.role.unwrap_or_else(|| default_role().to_string());
    let status = payload
        .status
        .unwrap_or_else(|| default_status().to_string());
    validate_choice(&role, &ADMIN_ROLES, "role")?;
    validate_choice(&status, &ADMIN_STATUSES, "status")?;

    let input = CreateAdminUser {
        username,
        email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        role,
        status,
        notes: payload.notes,
        password: payload.password,
        is_staff: payload.is_staff,
        is_superuser: payload.is_superuser,
    };

    let admin_user = state.admin_user_service().create(input, user.id).await?;

    tracing::info!(
        "Admin user '{}' provisioned by '{}'",
        admin_user.username,
        user.username
    );

    Ok(Json(ApiResponse::success(admin_user)))
}

pub async fn update_admin_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAdminUserRequest>,
) -> Result<Json<ApiResponse<AdminUser>>, ApiError> {
    require_staff(&user)?;
    let id = validate_id(id)?;

    let email = match payload.email {
        Some(email) => Some(validate_email(&email)?.to_string()),
        None => None,
    };
    if let Some(role) = &payload.role {
        validate_choice(role, &ADMIN_ROLES, "role")?;
    }
    if let Some(status) = &payload.status {
        validate_choice(status, &ADMIN_STATUSES, "status")?;
    }

    // An empty password field means "leave unchanged" (edit forms post the
    // whole record back).
    let password = payload.password.filter(|p| !p.is_empty());

    let input = UpdateAdminUser {
        email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        role: payload.role,
        status: payload.status,
        notes: payload.notes,
        password,
        is_staff: payload.is_staff,
        is_superuser: payload.is_superuser,
    };

    let scope = visibility_for(user.id, user.is_superuser);
    let admin_user = state
        .admin_user_service()
        .update(id, input, scope)
        .await?;

    Ok(Json(ApiResponse::success(admin_user)))
}

pub async fn delete_admin_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_staff(&user)?;
    let id = validate_id(id)?;

    let scope = visibility_for(user.id, user.is_superuser);
    state.admin_user_service().delete(id, scope).await?;

    tracing::info!("Admin user {} deleted by '{}'", id, user.username);

    Ok(Json(ApiResponse::success(())))
}
