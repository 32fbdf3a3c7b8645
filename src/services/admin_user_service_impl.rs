//! `SeaORM` implementation of the `AdminUserService` trait.

use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};

use crate::config::SecurityConfig;
use crate::db::repositories::principal::hash_password_blocking;
use crate::db::{AdminUserChanges, AdminUserRow, NewAdminUser, Store, VisibilityScope};
use crate::services::admin_user_service::{
    AdminUser, AdminUserError, AdminUserService, CreateAdminUser, MIN_PASSWORD_LEN,
    UpdateAdminUser,
};

pub struct SeaOrmAdminUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAdminUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl AdminUserService for SeaOrmAdminUserService {
    async fn list(&self, scope: VisibilityScope) -> Result<Vec<AdminUser>, AdminUserError> {
        let rows = self
            .store
            .list_admin_users(scope)
            .await
            .map_err(internal)?;

        Ok(rows.into_iter().map(admin_user_from_row).collect())
    }

    async fn get(&self, id: i32, scope: VisibilityScope) -> Result<AdminUser, AdminUserError> {
        let row = self
            .store
            .get_admin_user(id, scope)
            .await
            .map_err(internal)?
            .ok_or(AdminUserError::NotFound)?;

        Ok(admin_user_from_row(row))
    }

    async fn create(
        &self,
        input: CreateAdminUser,
        requesting_principal: i32,
    ) -> Result<AdminUser, AdminUserError> {
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(AdminUserError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = hash_password_blocking(&input.password, Some(self.security.clone()))
            .await
            .map_err(internal)?;

        let new = NewAdminUser {
            username: input.username,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role,
            status: input.status,
            notes: input.notes,
            password_hash,
            is_staff: input.is_staff,
            is_superuser: input.is_superuser,
        };

        let id = self
            .store
            .create_admin_user(new, Some(requesting_principal))
            .await
            .map_err(store_error)?;

        self.get(id, VisibilityScope::All).await
    }

    async fn update(
        &self,
        id: i32,
        input: UpdateAdminUser,
        scope: VisibilityScope,
    ) -> Result<AdminUser, AdminUserError> {
        // Scoped lookup first: ids outside the caller's visibility read as
        // absent rather than forbidden.
        self.get(id, scope).await?;

        let password_hash = match input.password {
            Some(password) => {
                if password.len() < MIN_PASSWORD_LEN {
                    return Err(AdminUserError::Validation(format!(
                        "Password must be at least {MIN_PASSWORD_LEN} characters"
                    )));
                }
                Some(
                    hash_password_blocking(&password, Some(self.security.clone()))
                        .await
                        .map_err(internal)?,
                )
            }
            None => None,
        };

        let changes = AdminUserChanges {
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            is_staff: input.is_staff,
            is_superuser: input.is_superuser,
            password_hash,
            role: input.role,
            status: input.status,
            notes: input.notes,
        };

        let updated = self
            .store
            .update_admin_user(id, changes)
            .await
            .map_err(store_error)?;

        if !updated {
            return Err(AdminUserError::NotFound);
        }

        self.get(id, VisibilityScope::All).await
    }

    async fn delete(&self, id: i32, scope: VisibilityScope) -> Result<(), AdminUserError> {
        self.get(id, scope).await?;

        let deleted = self
            .store
            .delete_admin_user(id)
            .await
            .map_err(store_error)?;

        if deleted {
            Ok(())
        } else {
            Err(AdminUserError::NotFound)
        }
    }
}

fn admin_user_from_row(row: AdminUserRow) -> AdminUser {
    let AdminUserRow {
        profile,
        principal,
        creator_name,
    } = row;

    let (username, email, first_name, last_name, is_staff, is_superuser) = match principal {
        Some(p) => (
            p.username,
            p.email,
            p.first_name,
            p.last_name,
            p.is_staff,
            p.is_superuser,
        ),
        None => Default::default(),
    };

    let full_name = format!("{first_name} {last_name}").trim().to_string();
    let is_active = profile.status == "active";

    AdminUser {
        id: profile.id,
        username,
        email,
        first_name,
        last_name,
        role: profile.role,
        status: profile.status,
        notes: profile.notes,
        is_staff,
        is_superuser,
        full_name,
        is_active,
        created_by_name: creator_name.unwrap_or_else(|| "System".to_string()),
        created_at: profile.created_at,
        updated_at: profile.updated_at,
    }
}

/// Map a store failure to the service taxonomy: unique violations are
/// conflicts, everything else is a database error.
fn store_error(err: anyhow::Error) -> AdminUserError {
    if let Some(db_err) = err.downcast_ref::<DbErr>() {
        if let Some(SqlErr::UniqueConstraintViolation(_)) = db_err.sql_err() {
            return AdminUserError::Conflict("Username already exists".to_string());
        }
        return AdminUserError::Database(db_err.to_string());
    }
    AdminUserError::Internal(err.to_string())
}

fn internal(err: anyhow::Error) -> AdminUserError {
    AdminUserError::Internal(err.to_string())
}
