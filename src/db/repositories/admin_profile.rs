use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::warn;

use crate::entities::{admin_profiles, prelude::*, principals};

use super::principal::generate_api_key;

/// Which admin profiles a caller is allowed to see.
///
/// Superusers see every profile; everyone else sees only the profiles they
/// provisioned. Applied as a query filter, never as handler branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    All,
    CreatedBy(i32),
}

/// A profile joined with its principal and the provisioning principal's name.
#[derive(Debug, Clone)]
pub struct AdminUserRow {
    pub profile: admin_profiles::Model,
    pub principal: Option<principals::Model>,
    pub creator_name: Option<String>,
}

pub struct NewAdminUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub status: String,
    pub notes: String,
    /// Already hashed; plaintext never reaches the repository.
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Default)]
pub struct AdminUserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

pub struct AdminProfileRepository {
    conn: DatabaseConnection,
}

impl AdminProfileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, scope: VisibilityScope) -> Result<Vec<AdminUserRow>> {
        let mut query = AdminProfiles::find().order_by_asc(admin_profiles::Column::Id);

        if let VisibilityScope::CreatedBy(principal_id) = scope {
            query = query.filter(admin_profiles::Column::CreatedBy.eq(principal_id));
        }

        let rows = query
            .find_also_related(Principals)
            .all(&self.conn)
            .await
            .context("Failed to list admin profiles")?;

        let creator_names = self
            .creator_names(rows.iter().filter_map(|(p, _)| p.created_by))
            .await?;

        Ok(rows
            .into_iter()
            .map(|(profile, principal)| {
                let creator_name = profile
                    .created_by
                    .and_then(|id| creator_names.get(&id).cloned());
                AdminUserRow {
                    profile,
                    principal,
                    creator_name,
                }
            })
            .collect())
    }

    pub async fn get(&self, id: i32, scope: VisibilityScope) -> Result<Option<AdminUserRow>> {
        let mut query = AdminProfiles::find_by_id(id);

        if let VisibilityScope::CreatedBy(principal_id) = scope {
            query = query.filter(admin_profiles::Column::CreatedBy.eq(principal_id));
        }

        let Some((profile, principal)) = query
            .find_also_related(Principals)
            .one(&self.conn)
            .await
            .context("Failed to query admin profile")?
        else {
            return Ok(None);
        };

        let creator_names = self.creator_names(profile.created_by.into_iter()).await?;
        let creator_name = profile
            .created_by
            .and_then(|id| creator_names.get(&id).cloned());

        Ok(Some(AdminUserRow {
            profile,
            principal,
            creator_name,
        }))
    }

    /// Create the principal and its profile in one transaction; neither row
    /// persists if either insert fails (e.g. duplicate username).
    pub async fn create(&self, new: NewAdminUser, created_by: Option<i32>) -> Result<i32> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let principal = principals::ActiveModel {
            username: Set(new.username),
            email: Set(new.email),
            password_hash: Set(new.password_hash),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            is_staff: Set(new.is_staff),
            is_superuser: Set(new.is_superuser),
            api_key: Set(generate_api_key()),
            date_joined: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let profile = admin_profiles::ActiveModel {
            principal_id: Set(principal.id),
            role: Set(new.role),
            status: Set(new.status),
            notes: Set(new.notes),
            created_by: Set(created_by),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(profile.id)
    }

    /// Apply a partial update to the profile and, when present, its linked
    /// principal. Returns `false` when no profile with this id exists.
    pub async fn update(&self, id: i32, changes: AdminUserChanges) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let Some(profile) = AdminProfiles::find_by_id(id).one(&txn).await? else {
            return Ok(false);
        };

        let principal = Principals::find_by_id(profile.principal_id).one(&txn).await?;

        match principal {
            Some(principal) => {
                let mut active: principals::ActiveModel = principal.into();
                if let Some(email) = changes.email {
                    active.email = Set(email);
                }
                if let Some(first_name) = changes.first_name {
                    active.first_name = Set(first_name);
                }
                if let Some(last_name) = changes.last_name {
                    active.last_name = Set(last_name);
                }
                if let Some(is_staff) = changes.is_staff {
                    active.is_staff = Set(is_staff);
                }
                if let Some(is_superuser) = changes.is_superuser {
                    active.is_superuser = Set(is_superuser);
                }
                if let Some(password_hash) = changes.password_hash {
                    active.password_hash = Set(password_hash);
                }
                active.update(&txn).await?;
            }
            None => {
                // Should be unreachable through the public contract; the
                // pair is created and destroyed together.
                warn!(
                    profile_id = id,
                    "admin profile has no linked principal; skipping identity update"
                );
            }
        }

        let mut active: admin_profiles::ActiveModel = profile.into();
        if let Some(role) = changes.role {
            active.role = Set(role);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(notes) = changes.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Delete the profile together with its principal. No authentication
    /// identity survives the business record.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let Some(profile) = AdminProfiles::find_by_id(id).one(&txn).await? else {
            return Ok(false);
        };

        let principal_id = profile.principal_id;

        AdminProfiles::delete_by_id(profile.id).exec(&txn).await?;
        Principals::delete_by_id(principal_id).exec(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }

    async fn creator_names(
        &self,
        ids: impl Iterator<Item = i32>,
    ) -> Result<HashMap<i32, String>> {
        let ids: Vec<i32> = ids.collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let creators = Principals::find()
            .filter(principals::Column::Id.is_in(ids))
            .all(&self.conn)
            .await
            .context("Failed to resolve creator principals")?;

        Ok(creators
            .into_iter()
            .map(|p| {
                let name = format!("{} {}", p.first_name, p.last_name)
                    .trim()
                    .to_string();
                let name = if name.is_empty() { p.username.clone() } else { name };
                (p.id, name)
            })
            .collect())
    }
}
